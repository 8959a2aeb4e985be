//! End-to-end flows through `SimService` against a scripted host.

use std::time::Duration;

use simlink_sdk::connection::Operation;
use simlink_sdk::payload;
use simlink_sdk::scripted::Call;
use simlink_sdk::{
    decode, frames, ClientConfig, CloudDensityMode, DecodeError, DispatchMessage, ManualClock, PartialResults,
    ScriptedConnection, ScriptedReply, SdkError, SimClient, SimService,
};

fn service(conn: ScriptedConnection) -> SimService<ScriptedConnection, ManualClock> {
    SimService::from_client(SimClient::with_clock(conn, ManualClock::new()), ClientConfig::default())
}

#[test]
fn tower_frequency_end_to_end() {
    let mut conn = ScriptedConnection::new();
    conn.push_idle()
        .push_reply(frames::facility_frequency(0x2001, 6, 118_700_000, "Tower"))
        .push_idle()
        .push_reply(frames::facility_data_end(0x2001));
    let mut svc = service(conn);

    let freqs = svc.get_frequency("kjfk").unwrap();
    assert_eq!(freqs.len(), 1);
    let tower = &freqs[0];
    assert_eq!(tower.kind, "TOWER");
    assert_eq!(tower.type_code, 6);
    assert_eq!(tower.name, "Tower");
    assert_eq!(tower.hz, 118_700_000);
    assert!((tower.mhz - 118.7).abs() < 1e-9);

    let json = serde_json::to_value(tower).unwrap();
    assert_eq!(json["type"], "TOWER");
}

#[test]
fn silent_host_times_out_with_zero_frequencies() {
    let mut svc = service(ScriptedConnection::new());

    let err = svc.get_frequency("KJFK").unwrap_err();
    let SdkError::Timeout(timeout) = &err else {
        panic!("expected timeout, got {err:?}");
    };
    assert_eq!(timeout.partial, PartialResults::Frequencies(Vec::new()));
    assert!(err.to_string().contains("0 items collected"));
    assert_eq!(svc.client().clock().elapsed(), Duration::from_secs(10));
    assert_eq!(svc.into_inner().close_count(), 1);
}

#[test]
fn weather_batch_fails_on_exception_after_other_reply() {
    let mut conn = ScriptedConnection::new();
    conn.push_reply(frames::weather_observation(0x3001, "EDDB 121850Z CAVOK"))
        .push_reply(frames::exception(15, 2, 1));
    let mut svc = service(conn);

    let err = svc.get_weather(&["EDDB", "XXXX"]).unwrap_err();
    let SdkError::Protocol(exc) = err else {
        panic!("expected protocol error, got {err:?}");
    };
    assert_eq!(exc.code, 15);
    assert_eq!(exc.name, "WEATHER_UNABLE_TO_GET_OBSERVATION");
    assert_eq!(svc.into_inner().close_count(), 1);
}

#[test]
fn session_is_closed_on_every_exit_path() {
    // Success.
    let mut conn = ScriptedConnection::new();
    conn.push_reply(frames::facility_data_end(0x2001));
    let mut svc = service(conn);
    svc.get_frequency("KJFK").unwrap();
    let conn = svc.into_inner();
    assert_eq!(conn.calls().last(), Some(&Call::Close));
    assert_eq!(conn.close_count(), 1);

    // Send failure.
    let mut conn = ScriptedConnection::new();
    conn.fail(Operation::AddField, 1);
    let mut svc = service(conn);
    assert!(matches!(svc.get_frequency("KJFK"), Err(SdkError::Connection(_))));
    assert_eq!(svc.into_inner().close_count(), 1);

    // Decode failure.
    let mut conn = ScriptedConnection::new();
    conn.push_reply(simlink_sdk::RawMessage::new(vec![0xFF; 6]));
    let mut svc = service(conn);
    assert!(matches!(svc.get_frequency("KJFK"), Err(SdkError::Decode(_))));
    assert_eq!(svc.into_inner().close_count(), 1);

    // Open failure: nothing to close.
    let mut conn = ScriptedConnection::new();
    conn.fail(Operation::Open, -1);
    let mut svc = service(conn);
    assert!(matches!(svc.get_frequency("KJFK"), Err(SdkError::Connection(_))));
    assert_eq!(svc.into_inner().close_count(), 0);
}

#[test]
fn truncated_messages_are_decode_errors() {
    let full = frames::facility_frequency(0x2001, 6, 118_700_000, "Tower");
    let bytes = full.as_bytes();

    // Cut inside the header or the fixed facility fields.
    for len in 0..40 {
        let mut cut = bytes[..len].to_vec();
        if len >= 4 {
            // Keep the header consistent with the shortened buffer.
            let size = u32::try_from(len).unwrap();
            cut[..4].copy_from_slice(&size.to_le_bytes());
        }
        let result = decode(&cut);
        assert!(
            matches!(result, Err(DecodeError::TooShort { .. })),
            "length {len} decoded as {result:?}"
        );
    }

    // Cut inside the frequency payload.
    for len in 40..bytes.len() {
        let mut cut = bytes[..len].to_vec();
        let size = u32::try_from(len).unwrap();
        cut[..4].copy_from_slice(&size.to_le_bytes());
        let DispatchMessage::FacilityData(data) = decode(&cut).unwrap() else {
            panic!("expected facility data at length {len}");
        };
        assert!(payload::decode_frequency(&data.data).is_err(), "length {len}");
    }

    // A header claiming more than was delivered.
    let mut oversized = bytes.to_vec();
    oversized.truncate(20);
    assert!(matches!(decode(&oversized), Err(DecodeError::SizeMismatch { .. })));
}

#[test]
fn decoding_is_pure() {
    let raw = frames::weather_observation(0x3001, "EDDB 121850Z 9999 BKN012");
    assert_eq!(raw.decode().unwrap(), raw.decode().unwrap());
}

#[test]
fn replay_file_drives_cloud_scan() {
    let mut steps = vec![
        ScriptedReply::Coordinates { request_id: 0x2002, lat: 52.36, lon: 13.5 },
        ScriptedReply::FacilityDataEnd { request_id: 0x2002 },
    ];
    for band in 0..20u32 {
        steps.push(ScriptedReply::CloudState {
            request_id: 0x4001 + band,
            density: if band == 6 { 200 } else { 0 },
        });
    }
    let json = serde_json::to_string(&steps).unwrap();
    let steps: Vec<ScriptedReply> = serde_json::from_str(&json).unwrap();

    let mut svc = service(ScriptedConnection::from_replay(&steps));
    let density = svc.get_cloud_density(&["EDDB"]).unwrap();
    let samples = density.values().next().unwrap();
    let overcast: Vec<_> = samples.iter().filter(|s| s.value == 200).collect();
    assert_eq!(overcast.len(), 1);
    assert_eq!((overcast[0].min_alt, overcast[0].max_alt), (3000, 3500));
}

#[test]
fn in_cloud_mode_from_config() {
    let mut conn = ScriptedConnection::new();
    conn.push_reply(frames::facility_coordinates(0x2002, 40.64, -73.78))
        .push_reply(frames::facility_data_end(0x2002))
        .push_reply(frames::sim_object_flag(0x5001, 1, false));

    let config = ClientConfig {
        cloud_mode: CloudDensityMode::InCloudFallback,
        timeout: Duration::from_millis(500),
        ..ClientConfig::default()
    };
    let mut svc = SimService::from_client(SimClient::with_clock(conn, ManualClock::new()), config);
    let density = svc.get_cloud_density(&["KJFK"]).unwrap();
    let samples = density.values().next().unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].value, 0);
}
