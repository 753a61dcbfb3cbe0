use std::time::Duration;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::error::Error;

pub const RETRY_DELAY: Duration = Duration::from_secs(60);

/// One outbound message to the administrator address.
#[derive(Debug, Clone)]
pub struct Mail {
    pub subject: String,
    pub body: String,
    pub reply_to: String,
}

pub trait Mailer {
    async fn send(&self, mail: &Mail) -> Result<(), Error>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admin: Mailbox,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, Error> {
    addr.parse().map_err(|e: lettre::address::AddressError| Error::MailError(e.to_string()))
}

impl SmtpMailer {
    pub fn new(host: &str, username: String, password: String, from: &str, admin: &str) -> Result<Self, Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| Error::MailError(e.to_string()))?
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from: parse_mailbox(from)?,
            admin: parse_mailbox(admin)?,
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::new(
            &dotenv::var("SMTP_HOST")?,
            dotenv::var("SMTP_USERNAME")?,
            dotenv::var("SMTP_PASSWORD")?,
            &dotenv::var("MAIL_FROM")?,
            &dotenv::var("ADMIN_EMAIL")?,
        )
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, mail: &Mail) -> Result<(), Error> {
        let mut builder = Message::builder().from(self.from.clone()).to(self.admin.clone()).subject(mail.subject.clone());
        if let Ok(reply_to) = mail.reply_to.parse() {
            builder = builder.reply_to(reply_to);
        }
        let message = builder.body(mail.body.clone()).map_err(|e| Error::MailError(e.to_string()))?;
        self.transport.send(message).await.map_err(|e| Error::MailError(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailQueue {
    tx: UnboundedSender<Mail>,
}

impl MailQueue {
    pub fn enqueue(&self, mail: Mail) -> Result<(), Error> {
        self.tx.send(mail).map_err(|_| Error::MailError("mail dispatcher is not running".into()))
    }
}

pub fn spawn_dispatcher<M: Mailer + 'static>(mailer: M, retry_delay: Duration) -> MailQueue {
    let (tx, rx) = unbounded_channel();
    actix_web::rt::spawn(dispatch(mailer, rx, retry_delay));
    MailQueue { tx }
}

/// Drains the queue until every sender is dropped. Each mail gets one retry
/// after `retry_delay`; a second failure is logged and the mail is dropped.
pub async fn dispatch<M: Mailer>(mailer: M, mut rx: UnboundedReceiver<Mail>, retry_delay: Duration) {
    while let Some(mail) = rx.recv().await {
        let id = Uuid::new_v4();
        log::info!("mail {}: dispatching \"{}\"", id, mail.subject);
        if let Err(e) = mailer.send(&mail).await {
            log::warn!("mail {}: send failed, retrying in {:?}: {}", id, retry_delay, e);
            tokio::time::sleep(retry_delay).await;
            if let Err(e) = mailer.send(&mail).await {
                log::error!("mail {}: retry failed, dropping: {}", id, e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Flaky {
        failures_left: AtomicUsize,
        sent: Arc<AtomicUsize>,
    }

    impl Mailer for Flaky {
        async fn send(&self, _mail: &Mail) -> Result<(), Error> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(Error::MailError("connection refused".into()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn mail() -> Mail {
        Mail {
            subject: "New Contact Form Submission: hello".into(),
            body: "Name: a\nEmail: a@b.c\n\nMessage:\nhi".into(),
            reply_to: "a@b.c".into(),
        }
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let sent = Arc::new(AtomicUsize::new(0));
        let mailer = Flaky {
            failures_left: AtomicUsize::new(0),
            sent: sent.clone(),
        };
        let (tx, rx) = unbounded_channel();
        tx.send(mail()).unwrap();
        drop(tx);
        dispatch(mailer, rx, Duration::ZERO).await;
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let sent = Arc::new(AtomicUsize::new(0));
        let mailer = Flaky {
            failures_left: AtomicUsize::new(1),
            sent: sent.clone(),
        };
        let (tx, rx) = unbounded_channel();
        tx.send(mail()).unwrap();
        drop(tx);
        dispatch(mailer, rx, Duration::ZERO).await;
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_after_second_failure() {
        let sent = Arc::new(AtomicUsize::new(0));
        let mailer = Flaky {
            failures_left: AtomicUsize::new(2),
            sent: sent.clone(),
        };
        let (tx, rx) = unbounded_channel();
        tx.send(mail()).unwrap();
        tx.send(mail()).unwrap();
        drop(tx);
        dispatch(mailer, rx, Duration::ZERO).await;
        // first mail burned both attempts, second went through untouched
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }
}
