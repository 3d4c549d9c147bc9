//! One-shot flash messages carried across a redirect.
//!
//! The cookie holds comma-separated message codes and is signed with the
//! configured cookie secret, so clients cannot inject arbitrary text.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

/// Name of the flash cookie.
pub const FLASH_COOKIE: &str = "flash";

/// Flash messages the site shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    /// Stored; the submitter must click the verification link.
    SubmittedPendingVerification,
    /// Stored; an admin has to approve it.
    SubmittedPendingReview,
    Verified,
    Updated,
    Deleted,
}

impl Flash {
    /// Code stored in the cookie.
    pub fn code(&self) -> &'static str {
        match self {
            Flash::SubmittedPendingVerification => "submitted",
            Flash::SubmittedPendingReview => "review",
            Flash::Verified => "verified",
            Flash::Updated => "updated",
            Flash::Deleted => "deleted",
        }
    }

    /// Parse a stored code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "submitted" => Some(Flash::SubmittedPendingVerification),
            "review" => Some(Flash::SubmittedPendingReview),
            "verified" => Some(Flash::Verified),
            "updated" => Some(Flash::Updated),
            "deleted" => Some(Flash::Deleted),
            _ => None,
        }
    }

    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Flash::SubmittedPendingVerification => {
                "Angebot gespeichert. Zur Freischaltung bitte Verifizierungslink in E-Mail klicken."
            }
            Flash::SubmittedPendingReview => {
                "Angebot gespeichert. Ihr Angebot wird in Kürze freigeschalten."
            }
            Flash::Verified => "Angebot freigeschalten.",
            Flash::Updated => "Änderungen gespeichert.",
            Flash::Deleted => "Angebot gelöscht.",
        }
    }
}

fn codes(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .map(|c| {
            c.value()
                .split(',')
                .filter_map(Flash::from_code)
                .collect()
        })
        .unwrap_or_default()
}

/// Queue a flash message for the next page view.
pub fn push(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let mut pending = codes(&jar);
    pending.push(flash);
    let value = pending
        .iter()
        .map(Flash::code)
        .collect::<Vec<_>>()
        .join(",");

    let cookie = Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Take all pending flash messages and clear the cookie.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<String>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }
    let messages = codes(&jar)
        .into_iter()
        .map(|f| f.message().to_string())
        .collect();
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(Key::generate())
    }

    #[test]
    fn test_codes_round_trip() {
        for flash in [
            Flash::SubmittedPendingVerification,
            Flash::SubmittedPendingReview,
            Flash::Verified,
            Flash::Updated,
            Flash::Deleted,
        ] {
            assert_eq!(Flash::from_code(flash.code()), Some(flash));
        }
        assert_eq!(Flash::from_code("<script>"), None);
    }

    #[test]
    fn test_push_then_take() {
        let jar = push(jar(), Flash::Verified);
        let jar = push(jar, Flash::Updated);

        let (jar, messages) = take(jar);
        assert_eq!(
            messages,
            vec!["Angebot freigeschalten.", "Änderungen gespeichert."]
        );

        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_take_without_cookie() {
        let (_, messages) = take(jar());
        assert!(messages.is_empty());
    }
}
