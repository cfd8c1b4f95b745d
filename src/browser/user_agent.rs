//! 浏览器指纹随机化
//!
//! 每次启动会话时随机挑选 User-Agent、窗口尺寸和窗口位置

use rand::seq::SliceRandom;
use rand::Rng;

/// 常见桌面浏览器的 User-Agent
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36 Edg/118.0.0.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
];

/// 常见窗口尺寸
pub const VIEWPORT_SIZES: &[(u32, u32)] = &[
    (1920, 1080),
    (1366, 768),
    (1536, 864),
    (1440, 900),
    (1280, 720),
];

/// 一次会话使用的浏览器指纹
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub window_position: (u32, u32),
}

impl Fingerprint {
    /// 随机生成
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string();
        let window_size = VIEWPORT_SIZES
            .choose(&mut rng)
            .copied()
            .unwrap_or((1920, 1080));
        let window_position = (rng.gen_range(0..=100), rng.gen_range(0..=100));

        Self {
            user_agent,
            window_size,
            window_position,
        }
    }

    /// 转换为 Chrome 启动参数
    pub fn to_args(&self, headless: bool) -> Vec<String> {
        let mut args = vec![format!("--user-agent={}", self.user_agent)];
        if !headless {
            args.push(format!(
                "--window-size={},{}",
                self.window_size.0, self.window_size.1
            ));
            args.push(format!(
                "--window-position={},{}",
                self.window_position.0, self.window_position.1
            ));
        }
        args
    }
}
