use std::sync::LazyLock;

use chrono::{DateTime, Local, Utc};
use contact::ContactSubmission;
use regex::Regex;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern is a valid regex"));

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #6A00F4, #9B5CFF); color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }
        .content { background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }
        .field { margin-bottom: 20px; padding: 15px; background: white; border-radius: 5px; border-left: 4px solid #6A00F4; }
        .label { font-weight: bold; color: #6A00F4; display: block; margin-bottom: 5px; }
        .value { color: #333; }
        .footer { text-align: center; margin-top: 20px; color: #666; font-size: 12px; }
"#;

pub fn subject_line(submission: &ContactSubmission) -> String {
    format!("Nuevo mensaje de contacto: {}", submission.subject)
}

/// Notification body. Fields must already be sanitized; they are embedded as is.
pub fn render(submission: &ContactSubmission, received_at: DateTime<Utc>) -> String {
    let message = LINE_BREAK.replace_all(&submission.message, "<br />$0");
    let received_at = received_at.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S");

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <style>{STYLE}</style>
</head>
<body>
    <div class="header">
        <h1>Nuevo Mensaje de Contacto</h1>
    </div>
    <div class="content">
        <div class="field">
            <span class="label">Nombre:</span>
            <span class="value">{name}</span>
        </div>
        <div class="field">
            <span class="label">Email:</span>
            <span class="value">{email}</span>
        </div>
        <div class="field">
            <span class="label">Asunto:</span>
            <span class="value">{subject}</span>
        </div>
        <div class="field">
            <span class="label">Mensaje:</span>
            <div class="value">{message}</div>
        </div>
        <div class="footer">
            <p>Este mensaje fue enviado desde el formulario de contacto de tu portfolio.</p>
            <p>Fecha: {received_at}</p>
        </div>
    </div>
</body>
</html>
"#,
        name = submission.name,
        email = submission.email,
        subject = submission.subject,
    )
}
