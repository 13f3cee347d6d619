pub const CHAT_PATH: &str = "/api/chat";
pub const MODELS_PATH: &str = "/api/models";
pub const HEALTH_PATH: &str = "/health";
pub const JOBS_PATH: &str = "/api/jobs";

pub const MAX_MESSAGE_CHARS: usize = 10000;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173";
pub const DEFAULT_JOBS_API_URL: &str = "https://remotive.com/api/remote-jobs?limit=20";
