//! Account flow replies in English and Chinese

use ops_assistant_core::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    AskEmail,
    EmailReprompt,
    EmailNotFound,
    EmailNotVerified,
    ScanCode,
    CodeReprompt,
    CodeRejected { remaining: Option<u32> },
    TooManyAttempts,
    PasswordReset { password: String },
    ResetFailed,
    AskName,
    NameReprompt,
    NameUpdated { username: Option<String>, display_name: Option<String> },
    ProfileFailed,
    SignInRequired,
}

impl Reply {
    pub fn render(&self, language: Language) -> String {
        if language.is_chinese() {
            self.chinese()
        } else {
            self.english()
        }
    }

    fn english(&self) -> String {
        match self {
            Self::AskEmail => "I can help you reset your password. \
                Please enter the email address registered to your account."
                .into(),
            Self::EmailReprompt => "That doesn't look like an email address. \
                Please enter the email registered to your account."
                .into(),
            Self::EmailNotFound => "No account is registered with that email address. \
                Please check it and start again."
                .into(),
            Self::EmailNotVerified => "We couldn't verify that email for a password reset. \
                Please contact your administrator if you need access."
                .into(),
            Self::ScanCode => "Scan this QR code with your authenticator app, \
                then enter the 6-digit code it shows."
                .into(),
            Self::CodeReprompt => {
                "Please enter the 6-digit code from your authenticator app.".into()
            }
            Self::CodeRejected { remaining: Some(n) } => format!(
                "That code is incorrect or has expired. Please try again ({} attempts left).",
                n
            ),
            Self::CodeRejected { remaining: None } => {
                "That code is incorrect or has expired. Please try again.".into()
            }
            Self::TooManyAttempts => {
                "Too many incorrect codes. Please start the password reset again.".into()
            }
            Self::PasswordReset { password } => format!(
                "Your password has been reset. Your new temporary password is: {}\n\
                 Please log in and change it right away.",
                password
            ),
            Self::ResetFailed => "Sorry, something went wrong while resetting your password. \
                Please try again later."
                .into(),
            Self::AskName => "Sure! What would you like your new name to be?".into(),
            Self::NameReprompt => {
                "Please tell me the new name, for example \"change my name to Alex Tan\".".into()
            }
            Self::NameUpdated { username, display_name } => match (username, display_name) {
                (Some(u), Some(d)) if u == d => {
                    format!("Done! Your name has been changed to {}.", u)
                }
                (Some(u), Some(d)) => format!(
                    "Done! Your username is now {} and your display name is now {}.",
                    u, d
                ),
                (Some(u), None) => format!("Done! Your username has been changed to {}.", u),
                (None, Some(d)) => format!("Done! Your display name has been changed to {}.", d),
                (None, None) => "Your profile is unchanged.".into(),
            },
            Self::ProfileFailed => {
                "Sorry, I couldn't update your profile right now. Please try again later.".into()
            }
            Self::SignInRequired => "You need to be signed in to change your profile.".into(),
        }
    }

    fn chinese(&self) -> String {
        match self {
            Self::AskEmail => "我可以帮您重置密码。请输入您账户注册的邮箱地址。".into(),
            Self::EmailReprompt => "这似乎不是有效的邮箱地址。请输入您账户注册的邮箱。".into(),
            Self::EmailNotFound => "该邮箱没有注册账户。请检查后重新开始。".into(),
            Self::EmailNotVerified => "无法验证该邮箱以重置密码。如需访问，请联系管理员。".into(),
            Self::ScanCode => "请用身份验证器应用扫描此二维码，然后输入显示的6位验证码。".into(),
            Self::CodeReprompt => "请输入身份验证器应用中的6位验证码。".into(),
            Self::CodeRejected { remaining: Some(n) } => format!("验证码错误或已过期，请重试（还剩{}次）。", n),
            Self::CodeRejected { remaining: None } => "验证码错误或已过期，请重试。".into(),
            Self::TooManyAttempts => "错误次数过多。请重新开始重置密码。".into(),
            Self::PasswordReset { password } => {
                format!("您的密码已重置。新的临时密码是：{}\n请登录后立即修改。", password)
            }
            Self::ResetFailed => "抱歉，重置密码时出错。请稍后再试。".into(),
            Self::AskName => "好的！您想改成什么名字？".into(),
            Self::NameReprompt => "请告诉我新名字，例如“把名字改成张伟”。".into(),
            Self::NameUpdated { username, display_name } => match (username, display_name) {
                (Some(u), Some(d)) if u == d => format!("完成！您的名字已改为{}。", u),
                (Some(u), Some(d)) => format!("完成！用户名已改为{}，显示名称已改为{}。", u, d),
                (Some(u), None) => format!("完成！用户名已改为{}。", u),
                (None, Some(d)) => format!("完成！显示名称已改为{}。", d),
                (None, None) => "您的资料没有变化。".into(),
            },
            Self::ProfileFailed => "抱歉，暂时无法更新您的资料。请稍后再试。".into(),
            Self::SignInRequired => "您需要登录后才能修改资料。".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_selection() {
        assert!(Reply::AskEmail.render(Language::English).contains("reset your password"));
        assert!(Reply::AskEmail.render(Language::Chinese).contains("重置密码"));
        // languages without a response set use English
        assert_eq!(Reply::AskName.render(Language::Thai), Reply::AskName.render(Language::English));
    }

    #[test]
    fn test_attempts_left() {
        let reply = Reply::CodeRejected { remaining: Some(2) };
        assert!(reply.render(Language::English).contains("2 attempts left"));
    }
}
