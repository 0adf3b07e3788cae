fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use serde::Deserialize;
    use serde_json::json;

    use hassbridge_hub_connection::InclusionPolicy;
    use hassbridge_lights::{ColorMode, LightCommand, LightState, to_local, to_service_call};
    use hassbridge_protocol::{
        AuthFrame, Entity, EntityStatus, EventPayload, Request, RequestFrame, ServerFrame,
        ServiceCall, StateChangedData,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Decodes a captured hub frame the way the connection does.
    fn server_frame(name: &str) -> ServerFrame {
        ServerFrame::from_text(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to decode {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  Hub:  {fixture}\n  Rust: {reserialized}"
        );
    }

    /// Asserts that a frame we build serializes to the captured one.
    fn outbound_test<T: serde::Serialize>(name: &str, frame: &T) {
        let fixture = load_fixture(name);
        let ours = serde_json::to_value(frame).unwrap();
        assert_eq!(
            fixture, ours,
            "outbound mismatch for {name}:\n  Hub:  {fixture}\n  Rust: {ours}"
        );
    }

    // --- Handshake ---

    #[test]
    fn fixture_auth_required() {
        roundtrip_test::<ServerFrame>("auth_required.json");
        assert!(matches!(
            server_frame("auth_required.json"),
            ServerFrame::AuthRequired { ha_version: Some(v) } if v == "2024.6.1"
        ));
    }

    #[test]
    fn fixture_auth_ok() {
        roundtrip_test::<ServerFrame>("auth_ok.json");
    }

    #[test]
    fn fixture_auth_invalid() {
        roundtrip_test::<ServerFrame>("auth_invalid.json");
        assert!(matches!(
            server_frame("auth_invalid.json"),
            ServerFrame::AuthInvalid { message: Some(_) }
        ));
    }

    #[test]
    fn fixture_auth_request() {
        let frame = AuthFrame {
            access_token: "ABCDEFGH".into(),
        };
        outbound_test("auth_request.json", &frame);
    }

    // --- Requests ---

    #[test]
    fn fixture_get_states_request() {
        outbound_test(
            "get_states_request.json",
            &RequestFrame::new(1, Request::GetStates),
        );
    }

    #[test]
    fn fixture_subscribe_events_request() {
        let request = Request::SubscribeEvents {
            event_type: "state_changed".into(),
        };
        outbound_test(
            "subscribe_events_request.json",
            &RequestFrame::new(2, request),
        );
    }

    #[test]
    fn fixture_ping_request() {
        outbound_test("ping_request.json", &RequestFrame::new(19, Request::Ping));
    }

    #[test]
    fn fixture_call_service_request() {
        roundtrip_test::<RequestFrame>("call_service_request.json");
    }

    #[test]
    fn light_command_produces_captured_call() {
        let current = LightState {
            reachable: true,
            on: Some(true),
            ..LightState::default()
        };
        let command = LightCommand {
            bri: Some(180),
            xy: Some([0.4573, 0.41]),
            transitiontime: Some(4),
            ..LightCommand::default()
        };
        let call = to_service_call("light.kitchen", &current, &command).unwrap();
        outbound_test(
            "call_service_request.json",
            &RequestFrame::new(24, Request::CallService(call)),
        );
    }

    #[test]
    fn call_service_request_decodes() {
        let frame: RequestFrame =
            serde_json::from_value(load_fixture("call_service_request.json")).unwrap();
        assert_eq!(frame.id, 24);
        let Request::CallService(ServiceCall {
            domain,
            service,
            service_data,
        }) = frame.request
        else {
            panic!("expected call_service, got {:?}", frame.request);
        };
        assert_eq!(domain, "light");
        assert_eq!(service, "turn_on");
        assert_eq!(service_data["entity_id"], json!("light.kitchen"));
    }

    // --- Results ---

    #[test]
    fn fixture_pong() {
        roundtrip_test::<ServerFrame>("pong.json");
    }

    #[test]
    fn fixture_call_service_result() {
        roundtrip_test::<ServerFrame>("call_service_result.json");
    }

    #[test]
    fn fixture_result_failure() {
        roundtrip_test::<ServerFrame>("result_failure.json");
        let ServerFrame::Result(result) = server_frame("result_failure.json") else {
            panic!("expected result frame");
        };
        assert_eq!(result.id, Some(12));
        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.code, "not_found");
        assert!(error.message.contains("not found"));
    }

    #[test]
    fn unknown_frame_type_is_tolerated() {
        assert_eq!(server_frame("unknown_frame.json"), ServerFrame::Unknown);
    }

    #[test]
    fn get_states_result_decodes_every_entity() {
        let ServerFrame::Result(result) = server_frame("get_states_result.json") else {
            panic!("expected result frame");
        };
        assert_eq!(result.id, Some(1));
        assert!(result.success);

        let items = result.result.unwrap();
        let entities: Vec<Entity> = items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| Entity::deserialize(item).unwrap())
            .collect();
        assert_eq!(entities.len(), 3);

        let kitchen = &entities[0];
        assert_eq!(kitchen.entity_id, "light.kitchen");
        assert_eq!(kitchen.state, EntityStatus::On);
        assert_eq!(kitchen.attributes.brightness(), Some(180));
        assert_eq!(kitchen.attributes.color_temp(), None);
        assert_eq!(kitchen.attributes.xy_color(), Some([0.4573, 0.41]));
        assert_eq!(kitchen.attributes.friendly_name(), Some("Kitchen"));
        assert_eq!(
            kitchen.attributes.supported_color_modes(),
            vec!["color_temp".to_string(), "xy".to_string()]
        );
        assert!(kitchen.last_changed.is_some());

        let hallway = &entities[1];
        assert_eq!(hallway.state, EntityStatus::Off);
        assert_eq!(hallway.attributes.brightness(), None);
        assert_eq!(hallway.attributes.inclusion_flag(), Some("exclude"));

        let sensor = &entities[2];
        assert!(!sensor.is_light());
        assert_eq!(sensor.state, EntityStatus::Other("18.4".into()));
    }

    #[test]
    fn get_states_result_filtering() {
        let ServerFrame::Result(result) = server_frame("get_states_result.json") else {
            panic!("expected result frame");
        };
        let entities: Vec<Entity> = result
            .result
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|item| Entity::deserialize(item).unwrap())
            .collect();

        let admitted = |policy: InclusionPolicy| -> Vec<String> {
            entities
                .iter()
                .filter(|e| policy.admits(e))
                .map(|e| e.entity_id.clone())
                .collect()
        };
        assert_eq!(admitted(InclusionPolicy::new(true)), vec!["light.kitchen"]);
        assert!(admitted(InclusionPolicy::new(false)).is_empty());
    }

    #[test]
    fn get_states_kitchen_maps_to_xy_state() {
        let ServerFrame::Result(result) = server_frame("get_states_result.json") else {
            panic!("expected result frame");
        };
        let items = result.result.unwrap();
        let kitchen = Entity::deserialize(&items[0]).unwrap();

        let state = to_local(&kitchen);
        assert!(state.reachable);
        assert_eq!(state.on, Some(true));
        assert_eq!(state.bri, Some(180));
        assert_eq!(state.ct, None);
        assert_eq!(state.colormode, Some(ColorMode::Xy));
    }

    // --- Events ---

    fn state_changed(name: &str) -> StateChangedData {
        let ServerFrame::Event(frame) = server_frame(name) else {
            panic!("expected event frame in {name}");
        };
        assert_eq!(frame.id, Some(2));
        let payload: EventPayload = serde_json::from_value(frame.event).unwrap();
        assert_eq!(payload.event_type, "state_changed");
        serde_json::from_value(payload.data).unwrap()
    }

    #[test]
    fn state_changed_event_carries_new_state() {
        let data = state_changed("state_changed_event.json");
        assert_eq!(data.entity_id, "light.kitchen");
        assert_eq!(data.old_state.unwrap().state, EntityStatus::Off);

        let new_state = data.new_state.unwrap();
        assert_eq!(
            serde_json::to_value(to_local(&new_state)).unwrap(),
            json!({"reachable": true, "on": true, "bri": 77, "ct": 366, "colormode": "ct"})
        );
    }

    #[test]
    fn entity_removed_event_has_no_new_state() {
        let data = state_changed("entity_removed_event.json");
        assert_eq!(data.entity_id, "light.garage");
        assert!(data.new_state.is_none());
    }
}
