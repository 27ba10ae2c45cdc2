/// Recorded as the client origin when no address could be determined.
pub const UNKNOWN_ORIGIN: &str = "IP não detectado";

pub mod anonymization {

    pub const PLACEHOLDER_NAME: &str = "Usuário Anonimizado";

    pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "exemplo.com";

    /// Hex characters taken from the generated tag for placeholder emails.
    pub const PLACEHOLDER_EMAIL_TAG_LEN: usize = 8;
}

pub mod security {

    /// Length of the throwaway secret installed on anonymized accounts.
    pub const SCRAMBLE_SECRET_LEN: usize = 12;
}
