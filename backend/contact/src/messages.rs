pub const SUCCESS: &str = "¡Mensaje enviado exitosamente! Te contactaré pronto.";

pub const FORBIDDEN: &str = "Acceso directo no permitido.";
pub const MALFORMED: &str = "Solicitud inválida.";
pub const QUOTA_EXCEEDED: &str = "Has excedido el límite de envíos. Intenta más tarde.";
pub const SPAM_REJECTED: &str = "Tu mensaje contiene contenido no permitido.";
pub const DISPATCH_FAILED: &str =
    "Error al enviar el mensaje. Por favor, intenta más tarde o contáctame directamente.";

// Client side only
pub const SEND_FAILED: &str = "Error al enviar el mensaje. Intenta nuevamente.";
pub const CONNECTION_FAILED: &str = "Error al enviar el mensaje. Verifica tu conexión.";
