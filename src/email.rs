use anyhow::{Context, Result};
use lettre::{
    Message, Transport, transport::smtp::SmtpTransport,
    transport::smtp::authentication::Credentials,
};
use std::env;

fn create_mailer() -> Result<SmtpTransport> {
    let smtp_address = env::var("CINESKY_SMTP_ADDRESS").context("Missing CINESKY_SMTP_ADDRESS env var")?;
    let smtp_password =
        env::var("CINESKY_SMTP_PASSWORD").context("Missing CINESKY_SMTP_PASSWORD env var")?;
    let smtp_relay = env::var("CINESKY_SMTP_RELAY").unwrap_or_else(|_| "smtp.gmail.com".to_string());

    let credentials = Credentials::new(smtp_address, smtp_password);

    let mailer = SmtpTransport::relay(&smtp_relay)?
        .credentials(credentials)
        .build();

    Ok(mailer)
}

/// Forward a contact-form submission to the configured inbox
pub async fn send_contact_message(name: &str, reply_to: &str, message: &str) -> Result<()> {
    let contact_email =
        env::var("CINESKY_CONTACT_EMAIL").context("Missing CINESKY_CONTACT_EMAIL env var")?;
    let smtp_address = env::var("CINESKY_SMTP_ADDRESS").context("Missing CINESKY_SMTP_ADDRESS env var")?;

    let email = Message::builder()
        .from(
            format!("CineSky <{}>", smtp_address)
                .parse()
                .context("Failed to parse from address")?,
        )
        .reply_to(
            reply_to
                .parse()
                .context("Failed to parse reply-to address")?,
        )
        .to(contact_email
            .parse()
            .context("Failed to parse to address")?)
        .subject(format!("CineSky contact form: {}", name))
        .body(format!(
            "From: {} <{}>\n\n{}",
            name, reply_to, message
        ))?;

    let mailer = create_mailer()?;

    mailer.send(&email).context("Failed to send contact email")?;

    tracing::info!("Forwarded contact message from {}", reply_to);

    Ok(())
}
