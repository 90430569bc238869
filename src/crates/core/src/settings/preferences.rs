use super::store::KeyValueStore;
use crate::util::errors::LightChatResult;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const THEME_KEY: &str = "light_gpt_theme";
pub const USER_AVATAR_KEY: &str = "light_gpt_user_avatar";
pub const ROBOT_AVATAR_KEY: &str = "light_gpt_robot_avatar";
pub const SYSTEM_ROLE_KEY: &str = "light_gpt_system_role";
pub const API_KEY_KEY: &str = "light_gpt_api_key";

pub const DEFAULT_USER_AVATAR: &str = "🦊";
pub const DEFAULT_ROBOT_AVATAR: &str = "🤖";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(()),
        }
    }
}

/// User customization, loaded once and written through on every change.
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    user_avatar: String,
    robot_avatar: String,
    system_role: String,
    api_key: String,
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("theme", &self.theme)
            .field("user_avatar", &self.user_avatar)
            .field("robot_avatar", &self.robot_avatar)
            .field("system_role", &self.system_role)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

impl Preferences {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let non_empty = |key: &str| store.get(key).filter(|value| !value.is_empty());

        let theme = non_empty(THEME_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let user_avatar = non_empty(USER_AVATAR_KEY).unwrap_or_else(|| DEFAULT_USER_AVATAR.to_string());
        let robot_avatar =
            non_empty(ROBOT_AVATAR_KEY).unwrap_or_else(|| DEFAULT_ROBOT_AVATAR.to_string());
        let system_role = non_empty(SYSTEM_ROLE_KEY).unwrap_or_default();
        let api_key = non_empty(API_KEY_KEY).unwrap_or_default();

        debug!(
            "Preferences loaded: theme={}, has_system_role={}, has_api_key={}",
            theme,
            !system_role.is_empty(),
            !api_key.is_empty()
        );

        Self {
            store,
            theme,
            user_avatar,
            robot_avatar,
            system_role,
            api_key,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn user_avatar(&self) -> &str {
        &self.user_avatar
    }

    pub fn robot_avatar(&self) -> &str {
        &self.robot_avatar
    }

    pub fn system_role(&self) -> &str {
        &self.system_role
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn set_theme(&mut self, theme: Theme) -> LightChatResult<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> LightChatResult<Theme> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn set_user_avatar(&mut self, avatar: &str) -> LightChatResult<()> {
        let avatar = or_default(avatar, DEFAULT_USER_AVATAR);
        self.store.set(USER_AVATAR_KEY, &avatar)?;
        self.user_avatar = avatar;
        Ok(())
    }

    pub fn set_robot_avatar(&mut self, avatar: &str) -> LightChatResult<()> {
        let avatar = or_default(avatar, DEFAULT_ROBOT_AVATAR);
        self.store.set(ROBOT_AVATAR_KEY, &avatar)?;
        self.robot_avatar = avatar;
        Ok(())
    }

    /// A blank role removes the stored entry so the default applies again.
    pub fn set_system_role(&mut self, role: &str) -> LightChatResult<()> {
        if role.trim().is_empty() {
            self.store.remove(SYSTEM_ROLE_KEY)?;
            self.system_role.clear();
        } else {
            self.store.set(SYSTEM_ROLE_KEY, role)?;
            self.system_role = role.to_string();
        }
        Ok(())
    }

    pub fn set_api_key(&mut self, key: &str) -> LightChatResult<()> {
        let key = key.trim();
        if key.is_empty() {
            self.store.remove(API_KEY_KEY)?;
        } else {
            self.store.set(API_KEY_KEY, key)?;
        }
        self.api_key = key.to_string();
        Ok(())
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
