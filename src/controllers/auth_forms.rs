//! Login and registration forms. Validation runs before any request is made.

use regex_lite::Regex;
use static_init::dynamic;

use crate::{
    data_types::User,
    errors::ValidationError,
    notifications::Notifier,
    session::Session,
};

const EMAIL_REQUIRED_MSG: &str = "El campo de correo es obligatorio.";
const EMAIL_INVALID_MSG: &str = "Por favor, ingrese un correo electrónico válido.";
const PASSWORD_REQUIRED_MSG: &str = "El campo de contraseña es obligatorio.";
const ALL_REQUIRED_MSG: &str = "Todos los campos son obligatorios.";
const REGISTER_EMAIL_INVALID_MSG: &str = "Correo electrónico inválido.";
const PASSWORD_MISMATCH_MSG: &str = "Las contraseñas no coinciden.";
const LOGIN_OK_MSG: &str = "Sesión iniciada correctamente";
const REGISTER_OK_MSG: &str = "Cuenta creada exitosamente.";
const REGISTER_ERR_MSG: &str = "Error al registrar. Intente nuevamente.";

fn is_email(text: &str) -> bool {
    #[dynamic]
    static RE: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
    RE.is_match(text)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.push(ValidationError::new("email", EMAIL_REQUIRED_MSG));
        } else if !is_email(email) {
            errors.push(ValidationError::new("email", EMAIL_INVALID_MSG));
        }
        if self.password.is_empty() {
            errors.push(ValidationError::new("password", PASSWORD_REQUIRED_MSG));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates, then logs in. Every failure has already been notified when
    /// this returns `None`.
    pub async fn submit(&self, session: &Session, notifier: &dyn Notifier) -> Option<User> {
        if let Err(errors) = self.validate() {
            for e in &errors {
                notifier.error(&e.message);
            }
            return None;
        }

        match session.login(self.email.trim(), &self.password, self.remember).await {
            Ok(user) => {
                notifier.success(LOGIN_OK_MSG);
                Some(user)
            }
            Err(e) => {
                log::warn!("Login failed: {}", e);
                notifier.error(e.login_message());
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Stops at the first failing rule, the way the registration page reports them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("username", self.username.trim()),
            ("email", self.email.trim()),
            ("password", self.password.as_str()),
            ("confirm_password", self.confirm_password.as_str()),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(ValidationError::new(*field, ALL_REQUIRED_MSG));
        }
        if !is_email(self.email.trim()) {
            return Err(ValidationError::new("email", REGISTER_EMAIL_INVALID_MSG));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::new("confirm_password", PASSWORD_MISMATCH_MSG));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &Session, notifier: &dyn Notifier) -> Option<User> {
        if let Err(e) = self.validate() {
            notifier.error(&e.message);
            return None;
        }

        match session
            .register(self.username.trim(), self.email.trim(), &self.password)
            .await
        {
            Ok(user) => {
                log::info!("Registered {} ({})", user.username, user.email);
                notifier.success(REGISTER_OK_MSG);
                Some(user)
            }
            Err(e) => {
                log::warn!("Registration failed: {}", e);
                notifier.error(REGISTER_ERR_MSG);
                None
            }
        }
    }
}
