use httpmock::prelude::*;
use rentwatch::dispatch::DispatchGateway;
use rentwatch::dispatch::EnqueueResult;
use rentwatch::dispatch::WebhookDispatchGateway;
use rentwatch::model::ChannelPreferences;
use rentwatch::model::DispatchRequest;

fn request() -> DispatchRequest {
    DispatchRequest {
        user_id: 1,
        listing_id: 42,
        filter_id: 7,
        channel_preferences: ChannelPreferences {
            telegram_chat_id: Some("chat-1".to_string()),
            email: None,
            whatsapp_number: None,
        },
    }
}

#[tokio::test]
async fn test_accepted_on_2xx() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/enqueue")
                .header("content-type", "application/json")
                .json_body_obj(&request());
            then.status(202);
        })
        .await;

    let gateway = WebhookDispatchGateway::new(server.url("/enqueue"));
    let result = gateway.enqueue(&request()).await.unwrap();

    assert_eq!(result, EnqueueResult::Accepted);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_on_server_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/enqueue");
            then.status(500);
        })
        .await;

    let gateway = WebhookDispatchGateway::new(server.url("/enqueue"));
    let result = gateway.enqueue(&request()).await.unwrap();

    assert_eq!(result, EnqueueResult::Rejected);
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    // Nothing is listening on this port.
    let gateway = WebhookDispatchGateway::new("http://127.0.0.1:1/enqueue");
    let result = gateway.enqueue(&request()).await;

    assert!(result.is_err());
}
