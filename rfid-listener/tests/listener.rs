//! Push connections from a simulated reader to the notification listener

use rfid_core::{ReaderEvent, ReportKind};
use rfid_listener::{ListenerSettings, NotificationChannel, SubscriptionRegistry};
use rfid_test_harness::PushClient;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_test::assert_ok;

const WAIT: Duration = Duration::from_secs(2);

const TER: &str = "<report><id>17</id><ter><source><sourceName>Readpoint_1</sourceName>\
    <tag><tagID>E2001</tagID></tag><tag><tagID>E2002</tagID></tag></source></ter></report>";

const ALARM: &str = "<alarm><id>18</id><error><errorNumber>12</errorNumber><errorText>Antenna fault</errorText>\
    <utcTime>2024-01-01T00:00:00.000+00:00</utcTime><extraField>x</extraField></error></alarm>";

fn any_port() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn registry() -> (SubscriptionRegistry, broadcast::Receiver<ReaderEvent>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (tx, rx) = broadcast::channel(64);
    let settings = ListenerSettings {
        receive_timeout: Duration::from_millis(50),
        ..ListenerSettings::default()
    };
    (SubscriptionRegistry::new(settings, tx), rx)
}

async fn next_event(rx: &mut broadcast::Receiver<ReaderEvent>) -> ReaderEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no event in time")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_split_report_is_reassembled_and_acknowledged() {
    let (mut registry, mut rx) = registry();
    let addr = assert_ok!(registry.subscribe(NotificationChannel::Event, any_port(), true).await);

    let mut reader = PushClient::connect(&addr.to_string()).await.unwrap();
    let (head, tail) = TER.split_at(40);
    reader.send("<?xml version=\"1.0\"?>").await.unwrap();
    reader.send(head).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    reader.send(tail).await.unwrap();

    let ReaderEvent::Reports(reports) = next_event(&mut rx).await else {
        panic!("expected reports");
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::TagEvent);
    let ids: Vec<_> = reports[0].tags.iter().map(|t| t.tag_id.as_str()).collect();
    assert_eq!(ids, ["E2001", "E2002"]);

    let ack = reader.read_until("</reply>", WAIT).await.unwrap();
    assert_eq!(ack, "<reply><id>17</id><resultCode>0</resultCode><ter></reply>");

    registry.stop_all().await;
}

#[tokio::test]
async fn test_alarm_channel_ignores_reports() {
    let (mut registry, mut rx) = registry();
    let addr = registry
        .subscribe(NotificationChannel::Alarm, any_port(), false)
        .await
        .unwrap();

    let mut reader = PushClient::connect(&addr.to_string()).await.unwrap();
    reader.send(TER).await.unwrap();
    reader.send("<noise>x</noise>").await.unwrap();
    reader.send(ALARM).await.unwrap();

    let ReaderEvent::Alarms(alarms) = next_event(&mut rx).await else {
        panic!("expected alarms first");
    };
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].error_text, "Antenna fault");
    assert_eq!(alarms[0].extra.get("extraField").map(String::as_str), Some("x"));

    // acks are off
    assert!(reader.is_silent(Duration::from_millis(200)).await);
    registry.stop_all().await;
}

#[tokio::test]
async fn test_listener_accepts_again_after_disconnect() {
    let (mut registry, mut rx) = registry();
    let addr = registry
        .subscribe(NotificationChannel::All, any_port(), false)
        .await
        .unwrap();

    let mut first = PushClient::connect(&addr.to_string()).await.unwrap();
    first.send(ALARM).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, ReaderEvent::Alarms(_)));
    drop(first);

    let mut second = PushClient::connect(&addr.to_string()).await.unwrap();
    second.send(TER).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, ReaderEvent::Reports(_)));

    registry.stop_all().await;
}

#[tokio::test]
async fn test_subscribe_replaces_and_unsubscribe_all_recurses() {
    let (mut registry, _rx) = registry();
    registry
        .subscribe(NotificationChannel::Event, any_port(), false)
        .await
        .unwrap();
    let second = registry
        .subscribe(NotificationChannel::Event, any_port(), false)
        .await
        .unwrap();
    assert_eq!(registry.local_addr(NotificationChannel::Event), Some(second));

    registry
        .subscribe(NotificationChannel::Alarm, any_port(), false)
        .await
        .unwrap();
    assert!(registry.unsubscribe(NotificationChannel::All).await);
    assert!(!registry.is_active(NotificationChannel::Event));
    assert!(!registry.is_active(NotificationChannel::Alarm));
    assert!(!registry.unsubscribe(NotificationChannel::Event).await);
}

#[tokio::test]
async fn test_subscribe_all_replaces_single_channels() {
    let (mut registry, mut rx) = registry();
    let event_addr = registry
        .subscribe(NotificationChannel::Event, any_port(), false)
        .await
        .unwrap();
    registry
        .subscribe(NotificationChannel::Alarm, any_port(), false)
        .await
        .unwrap();

    let all_addr = assert_ok!(registry.subscribe(NotificationChannel::All, any_port(), false).await);
    assert!(registry.is_active(NotificationChannel::All));
    assert!(!registry.is_active(NotificationChannel::Event));
    assert!(!registry.is_active(NotificationChannel::Alarm));
    assert!(PushClient::connect(&event_addr.to_string()).await.is_err());

    let mut reader = PushClient::connect(&all_addr.to_string()).await.unwrap();
    reader.send(TER).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, ReaderEvent::Reports(_)));
    // published once
    assert!(tokio::time::timeout(Duration::from_millis(300), rx.recv()).await.is_err());

    registry.stop_all().await;
}
