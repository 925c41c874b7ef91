use serde_json::json;
use webdriver::capabilities::Capabilities;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
/// Browser window and identity settings applied when a session starts.
pub struct LaunchProfile {
    pub headless: bool,
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub languages: Vec<String>,
}

impl Default for LaunchProfile {
    fn default() -> Self {
        Self {
            headless: false,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            viewport: (1920, 1080),
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }
}

impl LaunchProfile {
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// Chrome command-line arguments for a profile.
pub fn chrome_arguments(profile: &LaunchProfile) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!("--window-size={},{}", profile.viewport.0, profile.viewport.1),
        format!("--lang={}", profile.languages.join(",")),
    ];
    if profile.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    } else {
        args.push("--start-maximized".to_string());
    }
    args
}

/// W3C capabilities requesting a Chrome session configured by `profile`.
pub fn capabilities(profile: &LaunchProfile) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": chrome_arguments(profile) }),
    );
    caps
}
