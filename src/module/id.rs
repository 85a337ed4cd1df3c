use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

use crate::module::OptionValue;

/// Identifier of every module known to the engine.
///
/// The set is fixed at compile time; configuration documents refer to modules by their
/// `snake_case` name (`fps_spoof`, `remove_store_button`, ...).
///
/// # Examples
///
/// ```rust
/// use std::str::FromStr;
/// use classpatch::module::ModuleId;
///
/// assert_eq!(ModuleId::from_str("fps_spoof").unwrap(), ModuleId::FpsSpoof);
/// assert_eq!(ModuleId::MetadataUrl.to_string(), "metadata_url");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ModuleId {
    /// Replaces the labels of the FPS, CPS, reach, nick hider, auto GG and level head mods
    ChangeModStrings,
    /// Multiplies the FPS value shown by the FPS mod
    FpsSpoof,
    /// Hides sections of the launcher metadata
    Metadata,
    /// Fetches launcher metadata from a different URL
    MetadataUrl,
    /// Routes Discord rich presence updates through a host hook
    DiscordRichPresence,
    /// Stops the client from sending process and hosts file listings
    Privacy,
    /// Removes the randomly generated level shown for nicked players
    RemoveFakeLevelHead,
    /// Removes the store button from the main menu
    RemoveStoreButton,
    /// Connects the asset websocket to a different URL
    WebsocketUrl,
    /// Renders cloth capes without a subscription check
    ClothCapes,
    /// Scales the camera shake when taking damage
    HurtCamShake,
    /// Disables the mouse polling rate popup
    RemoveMousePopup,
    /// Lifts the limit of eight profiles
    RemoveProfilesCap,
    /// Replaces the labels of the toggle sprint mod
    ToggleSprintText,
    /// Accepts accounts that cannot play online
    AllowCrackedAccounts,
    /// Removes the click delay of the legacy combat mode
    NoHitDelay,
    /// Keeps emotes playing while moving
    InfiniteEmotes,
}

impl ModuleId {
    /// Default option values of this module.
    ///
    /// Options without a default (the URLs and the rich presence hook owner) must be provided
    /// by the configuration before the module can be enabled.
    #[must_use]
    pub fn default_options(self) -> Vec<(&'static str, OptionValue)> {
        let text = |key, value: &str| (key, OptionValue::Text(value.to_string()));
        match self {
            ModuleId::ChangeModStrings => vec![
                text("fps_text", "FPS"),
                text("cps_text", "CPS"),
                text("nickhider_text", "You"),
                text("auto_gg_command", "/achat gg"),
                text("level_head_text", "Level"),
                text("reach_text", "blocks"),
            ],
            ModuleId::FpsSpoof | ModuleId::HurtCamShake => {
                vec![("multiplier", OptionValue::Float(1.0))]
            }
            ModuleId::Metadata => vec![
                ("remove_blog_posts", OptionValue::Bool(true)),
                ("remove_client_settings", OptionValue::Bool(false)),
                ("remove_mod_settings", OptionValue::Bool(false)),
                ("remove_server_integration", OptionValue::Bool(false)),
                ("remove_pinned_servers", OptionValue::Bool(false)),
            ],
            ModuleId::DiscordRichPresence => vec![
                text("client_id", ""),
                text("hook_name", "updateRichPresence"),
            ],
            ModuleId::ToggleSprintText => vec![
                text("flying_text", "flying"),
                text("flying_boost_text", "boost"),
                text("riding_text", "riding"),
                text("descending_text", "descending"),
                text("dismounting_text", "dismounting"),
                text("sneaking_text", "sneaking"),
                text("toggled_text", "toggled"),
                text("sprinting_text", "sprinting"),
            ],
            _ => Vec::new(),
        }
    }
}
