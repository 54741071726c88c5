/// Prompt templates used by the controllers: fixed local text, or a
/// reference to a named prompt generated by one specific peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptTemplate {
    Static(String),
    Remote {
        peer_name: String,
        prompt_name: String,
    },
}

impl PromptTemplate {
    pub fn static_text(text: impl Into<String>) -> Self {
        PromptTemplate::Static(text.into())
    }

    pub fn remote(peer_name: impl Into<String>, prompt_name: impl Into<String>) -> Self {
        PromptTemplate::Remote {
            peer_name: peer_name.into(),
            prompt_name: prompt_name.into(),
        }
    }
}

pub const CREATE_USER: &str = "\
Please create a user with the following information:
login: {login}
password: {password}
first name: {firstName}
last name: {lastName}
email: {email}
age: {age}
The deleted flag defaults to 0.
";

pub const GET_USER_BY_LOGIN: &str = "Please look up the user whose login is {login}.\n";

pub const GET_USERS_BY_EMAIL: &str = "Please look up all users whose email is {email}.\n";

pub const WEATHER: &str = "What's the weather like in {cityName} today?\n";

pub const WEATHER_PEER: &str = "weather-mcp-server";
pub const WEATHER_PROMPT: &str = "weather-by-city-name";

pub fn create_user() -> PromptTemplate {
    PromptTemplate::static_text(CREATE_USER)
}

pub fn get_user_by_login() -> PromptTemplate {
    PromptTemplate::static_text(GET_USER_BY_LOGIN)
}

pub fn get_users_by_email() -> PromptTemplate {
    PromptTemplate::static_text(GET_USERS_BY_EMAIL)
}

pub fn weather() -> PromptTemplate {
    PromptTemplate::static_text(WEATHER)
}

pub fn weather_by_city_name() -> PromptTemplate {
    PromptTemplate::remote(WEATHER_PEER, WEATHER_PROMPT)
}
