//! Operation invoker and typed wrappers against the simulated service.

use std::io;

use winreg_core::{ClientConfig, RegistryClient, RegistryError};
use winreg_harness::SimTransport;
use winreg_proto::{
    KeyHandle, MS_RRP_INTERFACE, Opnum, PredefinedKey, RegistryValue, Regsam, ReturnCode,
    ValueType,
    messages::{
        EnumKeyResponse, EnumValueRequest, EnumValueResponse, OpenRootKeyRequest,
        QueryMultipleValuesResponse, QueryValueRequest, QueryValueResponse, SetValueRequest,
        ValueEntry,
    },
};

async fn open_root(client: &RegistryClient<SimTransport>) -> KeyHandle {
    client
        .open_predefined_key(PredefinedKey::LocalMachine, Regsam::KEY_READ)
        .await
        .unwrap()
        .key_handle
}

fn string_value(name: &str, text: &str, code: ReturnCode) -> EnumValueResponse {
    let data = RegistryValue::String(text.into()).to_bytes();
    let len = data.len() as u32;
    EnumValueResponse {
        name: name.into(),
        value_type: Some(ValueType::String),
        data: Some(data),
        data_size: Some(len),
        data_len: Some(len),
        return_code: code,
    }
}

#[tokio::test]
async fn every_predefined_key_uses_its_own_opnum() {
    let client = RegistryClient::new(SimTransport::new());

    for key in PredefinedKey::ALL {
        client.open_predefined_key(key, Regsam::MAXIMUM_ALLOWED).await.unwrap();
    }

    let sent: Vec<u16> = client.transport().calls().iter().map(|call| call.opnum).collect();
    assert_eq!(sent, [0, 1, 2, 3, 4, 27, 32, 33]);
    for call in client.transport().calls() {
        assert_eq!(call.interface, MS_RRP_INTERFACE);
        assert_eq!(call.payload.as_ref(), [0, 0, 0, 0, 0, 0, 0, 2]);
    }
}

#[tokio::test]
async fn raise_policy_is_per_call_or_configured() {
    let sim = SimTransport::new();
    sim.fail_always(Opnum::OpenCurrentUser, ReturnCode::ACCESS_DENIED);
    let client = RegistryClient::with_config(
        sim,
        ClientConfig { raise_on_error: false, ..ClientConfig::default() },
    );
    let request = OpenRootKeyRequest::<winreg_proto::messages::HkeyCurrentUser>::default();

    let returned = client.call(&request).await.unwrap();
    assert_eq!(returned.return_code, ReturnCode::ACCESS_DENIED);
    assert!(returned.key_handle.is_null());

    let raised = client.invoke(&request, true).await.unwrap_err();
    assert_eq!(raised.return_code(), Some(ReturnCode::ACCESS_DENIED));
    assert_eq!(raised.opnum(), Some(Opnum::OpenCurrentUser));
}

#[tokio::test]
async fn transport_and_decode_failures_keep_their_kind() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;

    client.transport().fail_io_next(Opnum::BaseRegFlushKey, io::ErrorKind::BrokenPipe);
    let err = client.flush_key(root).await.unwrap_err();
    assert!(matches!(err, RegistryError::Transport(ref source) if source.kind() == io::ErrorKind::BrokenPipe));

    client.transport().respond_raw(Opnum::BaseRegGetVersion, vec![1, 2, 3]);
    let err = client.get_version(root).await.unwrap_err();
    assert!(matches!(err, RegistryError::Decode { opnum: Opnum::BaseRegGetVersion, .. }));
}

#[tokio::test]
async fn enum_sub_keys_walks_indices_until_exhausted() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    for name in ["HARDWARE", "SAM", "SOFTWARE"] {
        let response = EnumKeyResponse { name: name.into(), ..EnumKeyResponse::default() };
        client.transport().respond_with(Opnum::BaseRegEnumKey, &response).unwrap();
    }

    let names = client.enum_sub_keys(root).await.unwrap();

    assert_eq!(names, ["HARDWARE", "SAM", "SOFTWARE"]);
    assert_eq!(client.transport().calls_to(Opnum::BaseRegEnumKey).len(), 4);
}

#[tokio::test]
async fn enum_values_resizes_large_values() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    let sim = client.transport();
    let long = "a value that does not fit the default query buffer";

    sim.respond_with(Opnum::BaseRegEnumValue, &string_value("Short", "ok", ReturnCode::SUCCESS)).unwrap();
    let mut too_big = string_value("Long", "", ReturnCode::MORE_DATA);
    too_big.data_size = Some(RegistryValue::String(long.into()).to_bytes().len() as u32);
    sim.respond_with(Opnum::BaseRegEnumValue, &too_big).unwrap();
    sim.respond_with(Opnum::BaseRegEnumValue, &string_value("Long", long, ReturnCode::SUCCESS)).unwrap();

    let values = client.enum_values(root).await.unwrap();

    let names: Vec<&str> = values.iter().map(|value| value.name.as_str()).collect();
    assert_eq!(names, ["Short", "Long"]);
    assert_eq!(values[1].value().unwrap(), RegistryValue::String(long.into()));

    let requests: Vec<EnumValueRequest> = sim
        .calls_to(Opnum::BaseRegEnumValue)
        .iter()
        .map(|call| call.decode().unwrap())
        .collect();
    let indices: Vec<u32> = requests.iter().map(|request| request.index).collect();
    assert_eq!(indices, [0, 1, 1, 2]);
    assert_eq!(requests[1].data_size, Some(32));
    assert_eq!(requests[2].data_size, too_big.data_size);
    assert_eq!(requests[1].name.capacity(), 1024);
    assert_eq!(requests[2].name.capacity(), 32_768);
}

#[tokio::test]
async fn enum_values_grows_the_name_buffer_for_long_names() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    let sim = client.transport();
    let long_name = "n".repeat(2000);

    let mut truncated = string_value("", "", ReturnCode::MORE_DATA);
    truncated.data_size = Some(4);
    sim.respond_with(Opnum::BaseRegEnumValue, &truncated).unwrap();
    sim.respond_with(Opnum::BaseRegEnumValue, &string_value(&long_name, "v", ReturnCode::SUCCESS)).unwrap();

    let values = client.enum_values(root).await.unwrap();

    assert_eq!(values.len(), 1);
    assert_eq!(values[0].name, long_name);
    let retry: EnumValueRequest = sim.calls_to(Opnum::BaseRegEnumValue)[1].decode().unwrap();
    assert_eq!(retry.index, 0);
    assert_eq!(retry.name.capacity(), 32_768);
    assert_eq!(retry.data_size, Some(32));
}

#[tokio::test]
async fn enum_values_refuses_oversized_reports() {
    let config = ClientConfig { max_value_size: 1024, ..ClientConfig::default() };
    let client = RegistryClient::with_config(SimTransport::new(), config);
    let root = open_root(&client).await;
    let mut huge = string_value("Big", "", ReturnCode::MORE_DATA);
    huge.data_size = Some(u32::MAX);
    client.transport().respond_with(Opnum::BaseRegEnumValue, &huge).unwrap();

    let err = client.enum_values(root).await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::ValueTooLarge { opnum: Opnum::BaseRegEnumValue, requested: u32::MAX, limit: 1024 }
    ));
    assert_eq!(client.transport().calls_to(Opnum::BaseRegEnumValue).len(), 1);
}

#[tokio::test]
async fn query_multiple_values_refuses_oversized_reports() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    let reply = QueryMultipleValuesResponse {
        total_size: 0xFFFF_FFFF,
        return_code: ReturnCode::MORE_DATA,
        ..QueryMultipleValuesResponse::default()
    };
    client.transport().respond_with(Opnum::BaseRegQueryMultipleValues, &reply).unwrap();

    let err = client.query_multiple_values(root, &["A"]).await.unwrap_err();

    assert!(matches!(err, RegistryError::ValueTooLarge { opnum: Opnum::BaseRegQueryMultipleValues, .. }));
    assert_eq!(client.transport().calls_to(Opnum::BaseRegQueryMultipleValues).len(), 1);
}

#[tokio::test]
async fn enum_values_keeps_custom_type_tags() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    let custom = ValueType::from_u32(0x0010_0000);
    let reply = EnumValueResponse {
        name: "Blob".into(),
        value_type: Some(custom),
        data: Some(vec![0xde, 0xad]),
        data_size: Some(2),
        data_len: Some(2),
        return_code: ReturnCode::SUCCESS,
    };
    client.transport().respond_with(Opnum::BaseRegEnumValue, &reply).unwrap();

    let values = client.enum_values(root).await.unwrap();

    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value_type, ValueType::Unknown(0x0010_0000));
    assert_eq!(values[0].value().unwrap(), RegistryValue::Other(custom, vec![0xde, 0xad]));
}

#[tokio::test]
async fn query_value_offers_the_configured_buffer() {
    let config = ClientConfig { query_buffer_size: 8, ..ClientConfig::default() };
    let client = RegistryClient::with_config(SimTransport::new(), config);
    let root = open_root(&client).await;
    let reply = QueryValueResponse {
        value_type: Some(ValueType::Dword),
        data: Some(vec![2, 0, 0, 0, 0, 0, 0, 0]),
        data_size: Some(4),
        data_len: Some(4),
        return_code: ReturnCode::SUCCESS,
    };
    client.transport().respond_with(Opnum::BaseRegQueryValue, &reply).unwrap();

    let value = client.query_typed_value(root, "Start").await.unwrap();

    assert_eq!(value, RegistryValue::Dword(2));
    let sent: QueryValueRequest =
        client.transport().calls_to(Opnum::BaseRegQueryValue)[0].decode().unwrap();
    assert_eq!(sent.value_name, "Start");
    assert_eq!(sent.capacity(), 8);
}

#[tokio::test]
async fn missing_value_is_reported_not_parsed() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;

    let err = client.query_typed_value(root, "Nope").await.unwrap_err();

    assert_eq!(err.return_code(), Some(ReturnCode::FILE_NOT_FOUND));
}

#[tokio::test]
async fn set_value_sends_typed_payload() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;

    client.set_value(root, "Start", &RegistryValue::Dword(4)).await.unwrap();

    let sent: SetValueRequest =
        client.transport().calls_to(Opnum::BaseRegSetValue)[0].decode().unwrap();
    assert_eq!(sent.key_handle, root);
    assert_eq!(sent.value_type, ValueType::Dword);
    assert_eq!(sent.data, [4, 0, 0, 0]);
    assert_eq!(sent.length_mismatch(), None);
}

#[tokio::test]
async fn query_multiple_values_slices_the_shared_buffer() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;
    let mut buffer = RegistryValue::Dword(1).to_bytes();
    buffer.extend(RegistryValue::String("x".into()).to_bytes());
    let reply = QueryMultipleValuesResponse {
        entries: vec![
            ValueEntry { name: "A".into(), len: 4, offset: 0, value_type: ValueType::Dword },
            ValueEntry { name: "B".into(), len: 4, offset: 4, value_type: ValueType::String },
        ],
        total_size: buffer.len() as u32,
        buffer: Some(buffer),
        return_code: ReturnCode::SUCCESS,
    };
    client.transport().respond_with(Opnum::BaseRegQueryMultipleValues, &reply).unwrap();

    let response = client.query_multiple_values(root, &["A", "B"]).await.unwrap();
    let values = response.values().unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(values[0].1, [1, 0, 0, 0]);
    assert_eq!(RegistryValue::parse(values[1].0.value_type, values[1].1).unwrap().as_str(), Some("x"));
}

#[tokio::test]
async fn query_info_key_and_version_defaults() {
    let client = RegistryClient::new(SimTransport::new());
    let root = open_root(&client).await;

    let info = client.query_info_key(root).await.unwrap();
    let version = client.get_version(root).await.unwrap();

    assert_eq!(info.sub_keys, 0);
    assert_eq!(version.version, winreg_harness::SIM_REGISTRY_VERSION);
}
