use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Enrollment, Voucher};
use crate::error::Result;

pub mod audit_log;

pub use audit_log::AuditLogSubscriber;

/// Facts published after a workflow change has been committed.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StudentEnrolled(Enrollment),
    StudentUnenrolled { enrollment: Enrollment, by: Uuid },
    VoucherSubmitted(Voucher),
    VoucherApproved { voucher: Voucher, enrollment_id: Option<Uuid> },
    VoucherRejected(Voucher),
    VoucherSeen(Voucher),
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::StudentEnrolled(_) => "student_enrolled",
            WorkflowEvent::StudentUnenrolled { .. } => "student_unenrolled",
            WorkflowEvent::VoucherSubmitted(_) => "voucher_submitted",
            WorkflowEvent::VoucherApproved { .. } => "voucher_approved",
            WorkflowEvent::VoucherRejected(_) => "voucher_rejected",
            WorkflowEvent::VoucherSeen(_) => "voucher_seen",
        }
    }
}

#[async_trait]
pub trait EventSubscriber: Send + Sync {
    fn name(&self) -> &str;
    async fn handle_event(&self, event: &WorkflowEvent) -> Result<()>;
}

pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub async fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        tracing::info!("Registered workflow subscriber: {}", subscriber.name());
        self.subscribers.write().await.push(subscriber);
    }

    /// Delivers an event to every subscriber. A failing subscriber is logged and
    /// never affects the already-committed operation that produced the event.
    pub async fn publish(&self, event: WorkflowEvent) {
        let subscribers = self.subscribers.read().await;

        for subscriber in subscribers.iter() {
            match subscriber.handle_event(&event).await {
                Ok(_) => {
                    tracing::debug!(
                        "Subscriber {} handled {}",
                        subscriber.name(),
                        event.name()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Subscriber {} failed to handle {}: {:?}",
                        subscriber.name(),
                        event.name(),
                        e
                    );
                }
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl EventSubscriber for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn handle_event(&self, _event: &WorkflowEvent) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventSubscriber for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle_event(&self, _event: &WorkflowEvent) -> Result<()> {
            Err(AppError::Internal("subscriber down".to_string()))
        }
    }

    fn enrolled() -> WorkflowEvent {
        WorkflowEvent::StudentEnrolled(Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            is_approved: true,
            enrolled_at: Utc::now(),
            approved_at: Some(Utc::now()),
        })
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others() {
        let dispatcher = EventDispatcher::new();
        let counting = Arc::new(Counting(AtomicUsize::new(0)));

        dispatcher.subscribe(Arc::new(Failing)).await;
        dispatcher.subscribe(counting.clone()).await;
        assert_eq!(dispatcher.subscriber_count().await, 2);

        dispatcher.publish(enrolled()).await;
        dispatcher.publish(enrolled()).await;

        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(enrolled().name(), "student_enrolled");
    }
}
