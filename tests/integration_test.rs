use std::env;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sqs::types::Message;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use rs_sqs_consumer::client;
use rs_sqs_consumer::consumer::SqsConsumer;
use rs_sqs_consumer::consumer::config::SqsConsumerConfig;
use rs_sqs_consumer::errors::SqsConsumerError;

#[derive(Clone)]
struct SharedCounter {
    count: Arc<Mutex<i32>>,
}

impl SharedCounter {
    fn new() -> Self {
        Self {
            count: Arc::new(Mutex::new(0)),
        }
    }

    async fn increment(&self) {
        let mut count = self.count.lock().await;
        *count += 1;
    }

    async fn get_count(&self) -> i32 {
        *self.count.lock().await
    }
}

async fn test_handler(message: Message, shared: SharedCounter) -> Result<(), SqsConsumerError> {
    println!("Received message: {:?}", message.body());
    shared.increment().await;
    Ok(())
}

fn test_config() -> SqsConsumerConfig {
    SqsConsumerConfig {
        poll_delay: Duration::from_millis(100),
        ..SqsConsumerConfig::default()
    }
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_SQS_QUEUE_URL"]
async fn test_sqs_consumer_integration() {
    dotenvy::dotenv().ok();

    let queue_url = env::var("TEST_SQS_QUEUE_URL").expect("TEST_SQS_QUEUE_URL must be set");

    let sqs_client = client::create_sqs_client_from_env().await;

    sqs_client
        .send_message()
        .queue_url(&queue_url)
        .message_body("Test message 1")
        .message_deduplication_id("test-message-1")
        .message_group_id("test-group")
        .send()
        .await
        .expect("Failed to send test message 1");

    sqs_client
        .send_message()
        .queue_url(&queue_url)
        .message_body("Test message 2")
        .message_deduplication_id("test-message-2")
        .message_group_id("test-group")
        .send()
        .await
        .expect("Failed to send test message 2");

    println!("Sent 2 test messages to queue");

    let shared_counter = SharedCounter::new();

    let consumer = SqsConsumer::with_handler_fn(
        sqs_client.clone(),
        &queue_url,
        test_handler,
        shared_counter.clone(),
        test_config(),
    );

    let shutdown = CancellationToken::new();
    let pipeline = consumer.start(shutdown.clone());

    let timeout_result = timeout(Duration::from_secs(30), async {
        loop {
            let count = shared_counter.get_count().await;
            println!("Current message count: {}", count);
            if count >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    })
    .await;

    shutdown.cancel();
    timeout(Duration::from_secs(10), pipeline)
        .await
        .expect("Consumer did not drain after shutdown")
        .expect("Consumer task failed");

    match timeout_result {
        Ok(_) => {
            let final_count = shared_counter.get_count().await;
            println!("Successfully processed {} messages", final_count);
            assert!(
                final_count >= 2,
                "Should have processed at least 2 messages"
            );
        }
        Err(_) => {
            let final_count = shared_counter.get_count().await;
            panic!("Test timed out. Only processed {} messages", final_count);
        }
    }

    let purge_result = sqs_client.purge_queue().queue_url(&queue_url).send().await;

    if let Err(e) = purge_result {
        println!("Warning: Failed to purge queue: {}", e);
    }
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_SQS_QUEUE_URL"]
async fn test_sqs_consumer_graceful_shutdown() {
    dotenvy::dotenv().ok();

    let queue_url = env::var("TEST_SQS_QUEUE_URL").expect("TEST_SQS_QUEUE_URL must be set");

    let sqs_client = client::create_sqs_client_from_env().await;

    sqs_client
        .send_message()
        .queue_url(&queue_url)
        .message_body("Shutdown test message")
        .message_deduplication_id("shutdown-test")
        .message_group_id("shutdown-test")
        .send()
        .await
        .expect("Failed to send test message");

    let shared_counter = SharedCounter::new();

    let consumer = SqsConsumer::with_handler_fn(
        sqs_client.clone(),
        &queue_url,
        |message: Message, shared: SharedCounter| async move {
            println!("Shutdown test handler received: {:?}", message.body());
            shared.increment().await;
            Ok::<(), SqsConsumerError>(())
        },
        shared_counter.clone(),
        test_config(),
    );

    let shutdown = CancellationToken::new();
    let pipeline = consumer.start(shutdown.clone());

    // Wait a bit for message processing to start
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("Sending shutdown signal...");
    shutdown.cancel();

    let shutdown_result = timeout(Duration::from_secs(10), pipeline).await;

    match shutdown_result {
        Ok(task_result) => {
            task_result.expect("Consumer task failed");
            println!("Consumer shut down gracefully");
        }
        Err(_) => {
            panic!("Shutdown test timed out - consumer did not shut down gracefully");
        }
    }

    let final_count = shared_counter.get_count().await;
    println!("Messages processed before shutdown: {}", final_count);

    assert!(
        final_count >= 1,
        "Should have processed at least 1 message before shutdown"
    );

    let purge_result = sqs_client.purge_queue().queue_url(&queue_url).send().await;

    if let Err(e) = purge_result {
        println!("Warning: Failed to purge queue: {}", e);
    }
}
