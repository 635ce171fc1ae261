mod resend;

pub use resend::{ResendTransport, DEFAULT_BASE_URL as RESEND_DEFAULT_BASE_URL};
