//! WebSocket message types.

use gridctl_orchestrator::RegistrySnapshot;
use serde::Serialize;

/// WebSocket message (tagged enum).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Full state, sent on connect.
    Snapshot(RegistrySnapshot),
    /// State after an orchestrator change.
    Update(RegistrySnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_tagged() {
        let msg = DashboardMessage::Update(RegistrySnapshot::default());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update");
        assert!(json["rows"].as_array().unwrap().is_empty());
        assert_eq!(json["edit_session"], false);
    }
}
