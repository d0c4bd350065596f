use std::collections::HashSet;

use chrono::Utc;

use super::{MockStore, StoreError};
use crate::models::{Message, NewMessage, Notification, NotificationKind, Role, User};

impl MockStore {
    /// Conversation history of a user, oldest first.
    #[tracing::instrument(name = "Fetching messages", skip(self))]
    pub async fn messages(&self, user_id: &str) -> Vec<Message> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut messages: Vec<Message> = data
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        messages
    }

    #[tracing::instrument(
        name = "Sending message",
        skip(self, message),
        fields(sender_id = %message.sender_id, receiver_id = %message.receiver_id)
    )]
    pub async fn send_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        if message.sender_id == message.receiver_id {
            return Err(StoreError::Validation(
                "You cannot send a message to yourself".to_string(),
            ));
        }
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        data.user(&message.receiver_id)?;
        let sender_name = data.user(&message.sender_id)?.full_name();

        let sent = Message {
            id: self.next_id("m"),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            timestamp: Utc::now(),
            read: false,
            attachment_url: message.attachment_url,
        };
        data.messages.push(sent.clone());
        data.notify(
            self.next_id("n"),
            &sent.receiver_id,
            NotificationKind::Message,
            "New Message",
            format!("You have a new message from {}", sender_name),
            "/messages",
        );
        Ok(sent)
    }

    /// Only the receiver can mark a message as read.
    #[tracing::instrument(name = "Marking message read", skip(self, user), fields(user_id = %user.id))]
    pub async fn mark_message_read(
        &self,
        user: &User,
        message_id: &str,
    ) -> Result<Message, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let message = data
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && m.receiver_id == user.id)
            .ok_or_else(|| StoreError::NotFound(format!("Message {}", message_id)))?;
        message.read = true;
        Ok(message.clone())
    }

    /// People the user can message: patients see every doctor, doctors see
    /// the patients they share an appointment or a conversation with.
    #[tracing::instrument(name = "Fetching contacts", skip(self, user), fields(user_id = %user.id))]
    pub async fn contacts(&self, user: &User) -> Vec<User> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        match user.role {
            Role::Patient => data.users_with_role(Role::Doctor).cloned().collect(),
            Role::Doctor => {
                let related: HashSet<&str> = data
                    .appointments
                    .iter()
                    .filter(|a| a.doctor_id == user.id)
                    .map(|a| a.patient_id.as_str())
                    .chain(data.messages.iter().filter_map(|m| {
                        if m.sender_id == user.id {
                            Some(m.receiver_id.as_str())
                        } else if m.receiver_id == user.id {
                            Some(m.sender_id.as_str())
                        } else {
                            None
                        }
                    }))
                    .collect();
                data.users_with_role(Role::Patient)
                    .filter(|patient| related.contains(patient.id.as_str()))
                    .cloned()
                    .collect()
            }
            Role::Admin => Vec::new(),
        }
    }

    /// Newest first.
    #[tracing::instrument(name = "Fetching notifications", skip(self))]
    pub async fn notifications(&self, user_id: &str) -> Vec<Notification> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut notifications: Vec<Notification> = data
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        notifications
    }

    #[tracing::instrument(name = "Marking notification read", skip(self))]
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<Notification, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let notification = data
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("Notification {}", notification_id)))?;
        notification.read = true;
        Ok(notification.clone())
    }
}
