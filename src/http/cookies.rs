//! Session cookie handling

use hyper::header::{HeaderMap, HeaderValue, InvalidHeaderValue, COOKIE};

/// Value of cookie `name` from the request's `Cookie` headers
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSpec {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl CookieSpec {
    /// `Set-Cookie` value carrying `token`
    pub fn issue(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        self.render(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that expires the cookie
    pub fn clear(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sid=abc123; x=1"));
        assert_eq!(read(&headers, "sid").as_deref(), Some("abc123"));
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid="));
        assert_eq!(read(&headers, "sid"), None);
    }

    #[test]
    fn test_issue_and_clear() {
        let spec = CookieSpec {
            name: "sid".into(),
            max_age_secs: 86_400,
            secure: true,
        };
        let issued = spec.issue("tok").unwrap();
        assert_eq!(
            issued.to_str().unwrap(),
            "sid=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400; Secure"
        );
        assert!(spec.clear().unwrap().to_str().unwrap().contains("Max-Age=0"));
    }
}
