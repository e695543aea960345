use std::io;

use dialoguer::{Input, console::Term, theme::ColorfulTheme};

/// Source of MFA token codes.
pub trait MfaPrompt {
    fn token_code(&self, mfa_serial: &str) -> io::Result<String>;
}

/// Prompts on stderr so stdout stays clean for `eval`.
#[derive(Debug, Default)]
pub struct TerminalMfaPrompt;

impl MfaPrompt for TerminalMfaPrompt {
    fn token_code(&self, mfa_serial: &str) -> io::Result<String> {
        let theme = ColorfulTheme::default();
        Input::<String>::with_theme(&theme)
            .with_prompt(format!("MFA token code for {mfa_serial}"))
            .validate_with(|input: &String| {
                if is_valid_token_code(input) {
                    Ok(())
                } else {
                    Err("MFA token code must be 6 digits")
                }
            })
            .interact_text_on(&Term::stderr())
            .map(|code| code.trim().to_string())
            .map_err(io::Error::other)
    }
}

fn is_valid_token_code(input: &str) -> bool {
    let code = input.trim();
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_token_code() {
        assert!(is_valid_token_code("123456"));
        assert!(is_valid_token_code(" 000000 "));
    }

    #[test]
    fn test_invalid_token_code() {
        assert!(!is_valid_token_code(""));
        assert!(!is_valid_token_code("12345"));
        assert!(!is_valid_token_code("1234567"));
        assert!(!is_valid_token_code("12a456"));
    }
}
