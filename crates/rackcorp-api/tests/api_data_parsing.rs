//! Integration tests for parsing recorded RackCorp responses.
//!
//! Each fixture is served through a mock server so the full request path,
//! envelope handling and field normalisation run exactly as in production.

use rackcorp_api::{
    Credential, CustomerId, DataCenterId, DeviceFilter, DeviceId, FirewallDirection,
    FirewallPolicyStatus, LoadBalancerFilter, LoadBalancerId, LoadBalancerScope, NetworkId,
    ProductDetails, RackcorpClient, TransactionFilter,
};
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEGACY_PATH: &str = "/api/rest/v2.8/json.php";

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn client_for(server: &MockServer) -> RackcorpClient {
    RackcorpClient::builder(Credential::new("dummy-uuid", "dummy-secret").unwrap())
        .with_base_url(format!("{}/api", server.uri()))
        .build()
        .unwrap()
}

async fn serve_rest(server: &MockServer, verb: &str, resource: &str, fixture: &str) {
    Mock::given(method(verb))
        .and(path(resource))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture(fixture)))
        .mount(server)
        .await;
}

async fn serve_legacy(server: &MockServer, command: &str, fixture: &str) {
    Mock::given(method("POST"))
        .and(path(LEGACY_PATH))
        .and(body_partial_json(serde_json::json!({ "cmd": command })))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture(fixture)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_device_get_fixture() {
    let server = MockServer::start().await;
    serve_rest(&server, "GET", "/api/v2.8/devices/5075", "device_get.json").await;

    let device = client_for(&server)
        .device_get(DeviceId::new(5075))
        .await
        .unwrap();

    assert_eq!(device.device_id, DeviceId::new(5075));
    assert_eq!(device.name, "web-1.example.com");
    assert_eq!(device.std_name.as_deref(), Some("WEB1"));
    assert_eq!(device.customer_id, Some(CustomerId::new(456)));
    assert_eq!(device.primary_ip, Some("203.0.113.10".parse::<IpAddr>().unwrap()));
    assert_eq!(device.data_center_id, Some(DataCenterId::new(3)));
    assert_eq!(device.vm_host_id, Some(DeviceId::new(912)));
    assert_eq!(device.date_created.unwrap().timestamp(), 1_575_590_400);
    assert_eq!(device.date_modified.unwrap().timestamp(), 1_700_000_000);
    assert!(!device.traffic_shared);
    assert_eq!(device.traffic_current, Some(1024.75));
    assert_eq!(device.traffic_estimated, Some(2048.0));
    assert_eq!(device.traffic_mb, Some(100_000));
    assert!(device.processor_utilisation.is_some());
    assert!(device.extra.contains_key("assets"));

    // Firewall policies arrive with a mix of quoted and bare numbers
    assert_eq!(device.firewall_policies.len(), 2);
    let ssh = &device.firewall_policies[0];
    assert_eq!(ssh.id, Some(301));
    assert_eq!(ssh.direction, Some(FirewallDirection::Input));
    assert_eq!(ssh.policy, Some(FirewallPolicyStatus::Allow));
    assert_eq!(ssh.port_from, Some(22));
    assert_eq!(ssh.port_to, Some(22));
    assert_eq!(ssh.ip_address.as_deref(), Some("198.51.100.0/24"));
    let catch_all = &device.firewall_policies[1];
    assert_eq!(catch_all.id, Some(302));
    assert_eq!(catch_all.order, Some(99));
    assert_eq!(catch_all.policy, Some(FirewallPolicyStatus::Reject));
}

#[tokio::test]
async fn test_device_get_is_repeatable() {
    let server = MockServer::start().await;
    serve_rest(&server, "GET", "/api/v2.8/devices/5075", "device_get.json").await;

    let client = client_for(&server);
    let first = client.device_get(DeviceId::new(5075)).await.unwrap();
    let second = client.device_get(DeviceId::new(5075)).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_device_getall_fixture() {
    let server = MockServer::start().await;
    serve_legacy(&server, "device.getall", "device_getall.json").await;

    let devices = client_for(&server)
        .device_get_all(&DeviceFilter::new().with_customer(CustomerId::new(456)))
        .await
        .unwrap();

    assert_eq!(devices.len(), 3, "Expected 3 devices in test data");

    let web = &devices[0];
    assert_eq!(web.device_id, DeviceId::new(5075));
    assert_eq!(web.primary_ip, Some("203.0.113.10".parse::<IpAddr>().unwrap()));
    assert!(web.vm_host_id.is_none());
    assert_eq!(web.ports.len(), 1);
    assert_eq!(web.ports[0].interface, Some(1));
    assert_eq!(web.ports[0].activity_in_mbit, Some(0.52));
    assert_eq!(web.ports[0].status.as_deref(), Some("UP"));

    let db = &devices[1];
    assert_eq!(db.device_id, DeviceId::new(5076));
    assert_eq!(db.customer_id, web.customer_id);
    assert_eq!(db.primary_ip, Some("2001:db8::10".parse::<IpAddr>().unwrap()));
    assert!(db.traffic_shared);

    // Empty strings mean "not set"
    let spare = &devices[2];
    assert_eq!(spare.device_id, DeviceId::new(5077));
    assert!(spare.customer_id.is_none());
    assert!(spare.primary_ip.is_none());
    assert!(spare.status.is_none());
}

#[tokio::test]
async fn test_loadbalancer_getall_fixture() {
    let server = MockServer::start().await;
    serve_legacy(&server, "loadbalancer.getall", "loadbalancer_getall.json").await;

    let load_balancers = client_for(&server)
        .load_balancer_get_all(&LoadBalancerFilter::default())
        .await
        .unwrap();

    assert_eq!(load_balancers.len(), 2);

    let edge = &load_balancers[0];
    assert_eq!(edge.id, LoadBalancerId::new(31));
    assert_eq!(edge.customer_id, Some(CustomerId::new(456)));
    assert_eq!(edge.host_source.as_deref(), Some("origin.example.com"));
    assert_eq!(edge.scope, Some(LoadBalancerScope::Global));
    assert!(edge.scope_network_id.is_none());
    assert!(edge.date_modified.is_none());
    assert_eq!(edge.version, Some(4));
    assert_eq!(edge.traffic_remaining_mb, Some(9728));
    assert!(edge.extra.contains_key("backends"));

    let internal = &load_balancers[1];
    assert_eq!(internal.scope, Some(LoadBalancerScope::Local));
    assert_eq!(internal.scope_network_id, Some(NetworkId::new(12)));
    assert_eq!(internal.scope_instances, Some(2));
}

#[tokio::test]
async fn test_transaction_getall_fixture() {
    let server = MockServer::start().await;
    serve_legacy(&server, "rctransaction.getall", "transaction_getall.json").await;

    let page = client_for(&server)
        .transaction_get_all(&TransactionFilter::new("DEVICE").with_object_id("5075"))
        .await
        .unwrap();

    assert_eq!(page.matches, Some(57));
    assert_eq!(page.transactions.len(), 2);

    let startup = &page.transactions[0];
    assert_eq!(startup.transaction_id, "9001");
    assert_eq!(startup.transaction_type, "STARTUP");
    assert_eq!(startup.status.as_deref(), Some("COMPLETED"));
    let data: serde_json::Value = serde_json::from_str(&startup.data).unwrap();
    assert_eq!(data["cloudInit"]["userData"], "#cloud-config");

    let shutdown = &page.transactions[1];
    assert_eq!(shutdown.transaction_id, "9002");
    assert_eq!(shutdown.object_id, "5075");
    assert!(shutdown.data.is_empty());
    assert!(shutdown.status_info.is_none());
}

#[tokio::test]
async fn test_order_create_fixture() {
    let server = MockServer::start().await;
    serve_legacy(&server, "order.create", "order_create.json").await;

    let details = ProductDetails::new()
        .with_cpu_count(1)
        .with_operating_system("UBUNTU14.04_64");
    let order = client_for(&server)
        .order_create("SERVER_VIRTUAL_PERFORMANCE_AU", "456", &details)
        .await
        .unwrap();

    assert_eq!(order.order_id, "123");
    assert_eq!(
        order.change_text,
        "Add NEW SUPPORT: SUPPORTSTD ($0.00)\nAdd NEW IPV6: 16 ($0.00)\n"
    );
}
