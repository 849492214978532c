use super::PendingRequest;
use super::RequestContext;
use crate::WatchError;
use crate::WatchEventType;
use crate::WatchResponse;

#[tokio::test]
async fn test_pending_request_round_trip() {
    let (request, reply_rx) = PendingRequest::new(7);
    assert_eq!(request.session_id(), 7);

    let response = WatchResponse {
        event_type: WatchEventType::KeyChanged as i32,
        table_id: 1,
        key: b"a".to_vec(),
        value: b"v".to_vec(),
        version: 11,
        extend: vec![],
    };
    request.transmit(Ok(response.clone())).unwrap();

    let reply = reply_rx.await.unwrap();
    assert_eq!(reply.unwrap(), response);
}

#[test]
fn test_second_transmit_fails() {
    let (request, _reply_rx) = PendingRequest::new(1);
    request.transmit(Ok(WatchResponse::default())).unwrap();

    let err = request.transmit(Ok(WatchResponse::default())).unwrap_err();
    assert!(matches!(err, WatchError::ReplyAlreadyTransmitted));
}

#[test]
fn test_transmit_to_gone_session() {
    let (request, reply_rx) = PendingRequest::new(42);
    drop(reply_rx);

    let err = request.transmit(Ok(WatchResponse::default())).unwrap_err();
    assert!(matches!(err, WatchError::SessionGone { session_id: 42 }));
}
