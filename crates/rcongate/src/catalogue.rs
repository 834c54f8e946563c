//! The fixed set of actions the gateway accepts.
//!
//! Messages are templates: `{arg_name}` is replaced with the validated value.

use gate_core::{Access, ActionInfo, ArgInfo, ArgKind};

#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
    pub description: &'static str,
}

pub const fn req(name: &'static str, kind: ArgKind, description: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        required: true,
        description,
    }
}

pub const fn opt(name: &'static str, kind: ArgKind, description: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        required: false,
        description,
    }
}

/// Replies for a command whose answer is relayed as text.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub ok: &'static str,
    pub failed: &'static str,
    /// Used instead when every optional argument was omitted.
    pub bare: Option<(&'static str, &'static str)>,
}

/// Replies for a command whose answer is a JSON list.
#[derive(Debug, Clone, Copy)]
pub struct ListShape {
    /// Top-level key holding the records.
    pub key: &'static str,
    /// Record fields shown per line, space-joined. Empty means the records are
    /// plain strings.
    pub fields: &'static [&'static str],
    pub heading: &'static str,
    pub empty: &'static str,
    pub parse_failed: &'static str,
    pub failed: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Relay { verb: &'static str, msgs: Messages },
    List { verb: &'static str, shape: ListShape },
    CheckUnban,
    Debug,
    Help,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub access: Access,
    pub args: &'static [ArgSpec],
    pub handler: Handler,
}

impl ActionSpec {
    pub fn info(&self) -> ActionInfo {
        ActionInfo {
            name: self.name.to_string(),
            description: self.description.to_string(),
            access: self.access,
            args: self
                .args
                .iter()
                .map(|a| ArgInfo {
                    name: a.name.to_string(),
                    kind: a.kind,
                    required: a.required,
                    description: a.description.to_string(),
                })
                .collect(),
        }
    }
}

pub const SERVER_ARG: &str = "server_name";

const SERVER: ArgSpec = req(SERVER_ARG, ArgKind::Str, "The name of the server");
const UNIQUE_ID: ArgSpec = req("unique_id", ArgKind::Str, "The unique ID of the player");

const fn relay(verb: &'static str, ok: &'static str, failed: &'static str) -> Handler {
    Handler::Relay {
        verb,
        msgs: Messages {
            ok,
            failed,
            bare: None,
        },
    }
}

const fn action(
    name: &'static str,
    description: &'static str,
    access: Access,
    args: &'static [ArgSpec],
    handler: Handler,
) -> ActionSpec {
    ActionSpec {
        name,
        description,
        access,
        args,
        handler,
    }
}

use Access::{Open, Privileged};
use ArgKind::{Bool, Int, Str};

pub static CATALOGUE: &[ActionSpec] = &[
    action(
        "kick",
        "Kick a player from a server",
        Privileged,
        &[SERVER, req("player_name", Str, "The name of the player to kick")],
        relay(
            "kick",
            "Player {player_name} kicked from {server_name}.",
            "Failed to kick player {player_name} from {server_name}.",
        ),
    ),
    action(
        "rotatemap",
        "Rotate map on a server",
        Privileged,
        &[SERVER],
        relay(
            "RotateMap",
            "Map rotated on {server_name}.",
            "Failed to rotate map on {server_name}.",
        ),
    ),
    action(
        "giveitem",
        "Give an item to a player",
        Privileged,
        &[
            SERVER,
            req("username", Str, "The name of the player"),
            req("item_id", Str, "The ID of the item to give"),
        ],
        relay(
            "giveitem",
            "Item {item_id} given to {username} on {server_name}.",
            "Failed to give item {item_id} to {username} on {server_name}.",
        ),
    ),
    action(
        "players",
        "Get the list of players on a server",
        Open,
        &[SERVER],
        Handler::List {
            verb: "RefreshList",
            shape: ListShape {
                key: "PlayerList",
                fields: &["Username"],
                heading: "Current Players on {server_name}:",
                empty: "No players currently on server '{server_name}'.",
                parse_failed: "Failed to parse player list response.",
                failed: "Failed to retrieve player list for server '{server_name}'.",
            },
        },
    ),
    action(
        "banlist",
        "Get the ban list for a server",
        Open,
        &[SERVER],
        Handler::List {
            verb: "banlist",
            shape: ListShape {
                key: "BanList",
                fields: &[],
                heading: "Banned Players on {server_name}:",
                empty: "No banned players currently on server '{server_name}'.",
                parse_failed: "Failed to parse ban list response.",
                failed: "Failed to retrieve ban list for server '{server_name}'.",
            },
        },
    ),
    action(
        "serverinfo",
        "Get the current status of a server",
        Open,
        &[SERVER],
        relay(
            "ServerInfo",
            "Server info for {server_name}.",
            "Failed to retrieve server info for {server_name}.",
        ),
    ),
    action(
        "checkunban",
        "Check unban time for a specific user",
        Open,
        &[req("username", Str, "The username to check")],
        Handler::CheckUnban,
    ),
    action(
        "debug",
        "DONT USE UNLESS NEEDED MAY BREAK BOT",
        Privileged,
        &[],
        Handler::Debug,
    ),
    action(
        "help",
        "List all commands and their descriptions",
        Open,
        &[],
        Handler::Help,
    ),
    action(
        "addmod",
        "Add a player to the moderator list",
        Privileged,
        &[SERVER, UNIQUE_ID],
        relay(
            "AddMod",
            "Player {unique_id} added to moderator list on {server_name}.",
            "Failed to add player {unique_id} to moderator list on {server_name}.",
        ),
    ),
    action(
        "removemod",
        "Remove a player from the moderator list",
        Privileged,
        &[SERVER, UNIQUE_ID],
        relay(
            "RemoveMod",
            "Player {unique_id} removed from moderator list on {server_name}.",
            "Failed to remove player {unique_id} from moderator list on {server_name}.",
        ),
    ),
    action(
        "setpin",
        "Set or remove the server pin",
        Privileged,
        &[SERVER, opt("pin", Str, "The pin number (optional)")],
        Handler::Relay {
            verb: "SetPin",
            msgs: Messages {
                ok: "Server pin set on {server_name}.",
                failed: "Failed to set server pin on {server_name}.",
                bare: Some((
                    "Server pin removed on {server_name}.",
                    "Failed to remove server pin on {server_name}.",
                )),
            },
        },
    ),
    action(
        "ban",
        "Ban a player from the server",
        Privileged,
        &[SERVER, req("player_name", Str, "The name of the player to ban")],
        relay(
            "Ban",
            "Player {player_name} banned from {server_name}.",
            "Failed to ban player {player_name} from {server_name}.",
        ),
    ),
    action(
        "unban",
        "Unban a player from the server",
        Privileged,
        &[SERVER, req("player_name", Str, "The name of the player to unban")],
        relay(
            "Unban",
            "Player {player_name} unbanned on {server_name}.",
            "Failed to unban player {player_name} on {server_name}.",
        ),
    ),
    action(
        "giverconplus",
        "Gives RCON plus menu",
        Privileged,
        &[SERVER, req("username", Str, "the username")],
        relay(
            "GiveMenu",
            "RCON plus given to {username} on {server_name}.",
            "Failed to give RCON on {server_name}.",
        ),
    ),
    action(
        "setmaxplayers",
        "Set the maximum number of players on the server",
        Privileged,
        &[SERVER, req("max_players", Int, "The maximum number of players")],
        relay(
            "SetMaxPlayers",
            "Maximum players set to {max_players} on {server_name}.",
            "Failed to set max players on {server_name}.",
        ),
    ),
    action(
        "settimelimit",
        "Set the time limit for the current match",
        Privileged,
        &[SERVER, req("minutes", Int, "The time limit in minutes")],
        relay(
            "SetTimeLimit",
            "Time limit set to {minutes} on {server_name}.",
            "Failed to set time limit on {server_name}.",
        ),
    ),
    action(
        "setcash",
        "Set the cash of a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("amount", Int, "The amount of cash")],
        relay(
            "SetCash",
            "Cash of {unique_id} set to {amount} on {server_name}.",
            "Failed to set cash of {unique_id} on {server_name}.",
        ),
    ),
    action(
        "givecash",
        "Give cash to a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("amount", Int, "The amount of cash")],
        relay(
            "GiveCash",
            "Gave {amount} cash to {unique_id} on {server_name}.",
            "Failed to give cash to {unique_id} on {server_name}.",
        ),
    ),
    action(
        "giveteamcash",
        "Give cash to all players on a team",
        Privileged,
        &[
            SERVER,
            req("team_id", Int, "The team ID"),
            req("amount", Int, "The amount of cash"),
        ],
        relay(
            "GiveTeamCash",
            "Gave {amount} cash to team {team_id} on {server_name}.",
            "Failed to give cash to team {team_id} on {server_name}.",
        ),
    ),
    action(
        "slap",
        "Deal damage to a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("amount", Int, "The amount of damage")],
        relay(
            "Slap",
            "Slapped {unique_id} for {amount} on {server_name}.",
            "Failed to slap {unique_id} on {server_name}.",
        ),
    ),
    action(
        "kill",
        "Kill a player",
        Privileged,
        &[SERVER, UNIQUE_ID],
        relay(
            "Kill",
            "Player {unique_id} killed on {server_name}.",
            "Failed to kill player {unique_id} on {server_name}.",
        ),
    ),
    action(
        "switchteam",
        "Switch a player to another team",
        Privileged,
        &[SERVER, UNIQUE_ID, req("team_id", Int, "The team ID")],
        relay(
            "SwitchTeam",
            "Player {unique_id} moved to team {team_id} on {server_name}.",
            "Failed to switch team of {unique_id} on {server_name}.",
        ),
    ),
    action(
        "teleport",
        "Teleport a player to another player",
        Privileged,
        &[
            SERVER,
            UNIQUE_ID,
            req("target_id", Str, "The unique ID of the destination player"),
        ],
        relay(
            "Teleport",
            "Player {unique_id} teleported to {target_id} on {server_name}.",
            "Failed to teleport {unique_id} on {server_name}.",
        ),
    ),
    action(
        "setplayerskin",
        "Set the skin of a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("skin_id", Str, "The skin ID")],
        relay(
            "SetPlayerSkin",
            "Skin of {unique_id} set to {skin_id} on {server_name}.",
            "Failed to set skin of {unique_id} on {server_name}.",
        ),
    ),
    action(
        "setbalancetableurl",
        "Set the balance table URL",
        Privileged,
        &[SERVER, req("url", Str, "The balance table URL")],
        relay(
            "SetBalanceTableURL",
            "Balance table URL set on {server_name}.",
            "Failed to set balance table URL on {server_name}.",
        ),
    ),
    action(
        "setlimitedammotype",
        "Set the limited ammo type",
        Privileged,
        &[SERVER, req("ammo_type", Int, "The ammo type")],
        relay(
            "SetLimitedAmmoType",
            "Limited ammo type set to {ammo_type} on {server_name}.",
            "Failed to set limited ammo type on {server_name}.",
        ),
    ),
    action(
        "enablecompmode",
        "Enable or disable competitive mode",
        Privileged,
        &[SERVER, req("enabled", Bool, "Whether competitive mode is on")],
        relay(
            "EnableCompMode",
            "Competitive mode set to {enabled} on {server_name}.",
            "Failed to change competitive mode on {server_name}.",
        ),
    ),
    action(
        "enableverboselogging",
        "Enable or disable verbose logging",
        Privileged,
        &[SERVER, req("enabled", Bool, "Whether verbose logging is on")],
        relay(
            "EnableVerboseLogging",
            "Verbose logging set to {enabled} on {server_name}.",
            "Failed to change verbose logging on {server_name}.",
        ),
    ),
    action(
        "enablewhitelist",
        "Enable or disable whitelist usage",
        Privileged,
        &[SERVER, req("enabled", Bool, "Whether the whitelist is used")],
        relay(
            "EnableWhitelist",
            "Whitelist set to {enabled} on {server_name}.",
            "Failed to change whitelist on {server_name}.",
        ),
    ),
    action(
        "shownametags",
        "Enable or disable name tags above friendly players",
        Privileged,
        &[SERVER, req("enabled", Bool, "Whether name tags are shown")],
        relay(
            "ShowNametags",
            "Name tags set to {enabled} on {server_name}.",
            "Failed to change name tags on {server_name}.",
        ),
    ),
    action(
        "shutdownserver",
        "Shutdown the server",
        Privileged,
        &[SERVER],
        relay(
            "Shutdown",
            "Shutdown sent to {server_name}.",
            "Failed to shut down {server_name}.",
        ),
    ),
    action(
        "resetsnd",
        "Reset the currently running SND match",
        Privileged,
        &[SERVER],
        relay(
            "ResetSND",
            "SND match reset on {server_name}.",
            "Failed to reset SND match on {server_name}.",
        ),
    ),
    action(
        "pausematch",
        "Pause the currently running match",
        Privileged,
        &[SERVER, req("seconds", Int, "How long to pause, in seconds")],
        relay(
            "PauseMatch",
            "Match paused for {seconds} seconds on {server_name}.",
            "Failed to pause match on {server_name}.",
        ),
    ),
    action(
        "switchmap",
        "Switch to a specific map and game mode",
        Privileged,
        &[
            SERVER,
            req("map_id", Str, "The map ID"),
            req("game_mode", Str, "The game mode"),
        ],
        relay(
            "SwitchMap",
            "Switching {server_name} to {map_id} ({game_mode}).",
            "Failed to switch map on {server_name}.",
        ),
    ),
    action(
        "addmaprotation",
        "Add a map to the map rotation",
        Privileged,
        &[
            SERVER,
            req("map_id", Str, "The map ID"),
            req("game_mode", Str, "The game mode"),
        ],
        relay(
            "AddMapRotation",
            "Map {map_id} ({game_mode}) added to rotation on {server_name}.",
            "Failed to add map {map_id} to rotation on {server_name}.",
        ),
    ),
    action(
        "removemaprotation",
        "Remove a map from the map rotation",
        Privileged,
        &[
            SERVER,
            req("map_id", Str, "The map ID"),
            req("game_mode", Str, "The game mode"),
        ],
        relay(
            "RemoveMapRotation",
            "Map {map_id} ({game_mode}) removed from rotation on {server_name}.",
            "Failed to remove map {map_id} from rotation on {server_name}.",
        ),
    ),
    action(
        "maplist",
        "Get the current map rotation",
        Privileged,
        &[SERVER],
        Handler::List {
            verb: "MapList",
            shape: ListShape {
                key: "MapList",
                fields: &["MapId", "GameMode"],
                heading: "Map Rotation on {server_name}:",
                empty: "No maps in rotation on server '{server_name}'.",
                parse_failed: "Failed to parse map list response.",
                failed: "Failed to retrieve map list for server '{server_name}'.",
            },
        },
    ),
    action(
        "itemlist",
        "List all items in the game",
        Privileged,
        &[SERVER],
        Handler::List {
            verb: "ItemList",
            shape: ListShape {
                key: "ItemList",
                fields: &[],
                heading: "Items on {server_name}:",
                empty: "No items reported by server '{server_name}'.",
                parse_failed: "Failed to parse item list response.",
                failed: "Failed to retrieve item list for server '{server_name}'.",
            },
        },
    ),
    action(
        "inspectplayer",
        "Get detailed status of a player",
        Privileged,
        &[SERVER, UNIQUE_ID],
        relay(
            "InspectPlayer",
            "Status of {unique_id} on {server_name}.",
            "Failed to inspect player {unique_id} on {server_name}.",
        ),
    ),
    action(
        "inspectteam",
        "Get detailed status of a team",
        Privileged,
        &[SERVER, req("team_id", Int, "The team ID")],
        relay(
            "InspectTeam",
            "Status of team {team_id} on {server_name}.",
            "Failed to inspect team {team_id} on {server_name}.",
        ),
    ),
    action(
        "inspectall",
        "Get detailed status of all players",
        Privileged,
        &[SERVER],
        Handler::List {
            verb: "InspectAll",
            shape: ListShape {
                key: "InspectList",
                fields: &["PlayerName", "UniqueId"],
                heading: "Player Status on {server_name}:",
                empty: "No players currently on server '{server_name}'.",
                parse_failed: "Failed to parse inspect response.",
                failed: "Failed to inspect players on server '{server_name}'.",
            },
        },
    ),
    action(
        "clearemptyvehicles",
        "Clear all empty vehicles",
        Privileged,
        &[SERVER],
        relay(
            "ClearEmptyVehicles",
            "Empty vehicles cleared on {server_name}.",
            "Failed to clear empty vehicles on {server_name}.",
        ),
    ),
    action(
        "disconnect",
        "Force the server to close the RCON connection",
        Privileged,
        &[SERVER],
        relay(
            "Disconnect",
            "RCON connection closed on {server_name}.",
            "Failed to close RCON connection on {server_name}.",
        ),
    ),
    action(
        "updateservername",
        "Update the server name",
        Privileged,
        &[SERVER, req("name", Str, "The new server name")],
        relay(
            "UpdateServerName",
            "Server name of {server_name} updated to {name}.",
            "Failed to update server name of {server_name}.",
        ),
    ),
    action(
        "ugcaddmod",
        "Add a mod to the server",
        Privileged,
        &[SERVER, req("ugc_id", Str, "The UGC ID of the mod")],
        relay(
            "UGCAddMod",
            "Mod {ugc_id} added on {server_name}.",
            "Failed to add mod {ugc_id} on {server_name}.",
        ),
    ),
    action(
        "ugcremovemod",
        "Remove a mod from the server",
        Privileged,
        &[SERVER, req("ugc_id", Str, "The UGC ID of the mod")],
        relay(
            "UGCRemoveMod",
            "Mod {ugc_id} removed on {server_name}.",
            "Failed to remove mod {ugc_id} on {server_name}.",
        ),
    ),
    action(
        "ugcclearmodlist",
        "Clear all mods from the server",
        Privileged,
        &[SERVER],
        relay(
            "UGCClearModList",
            "Mod list cleared on {server_name}.",
            "Failed to clear mod list on {server_name}.",
        ),
    ),
    action(
        "ugcmodlist",
        "List all mods on the server",
        Privileged,
        &[SERVER],
        relay(
            "UGCModList",
            "Mods on {server_name}.",
            "Failed to retrieve mod list for {server_name}.",
        ),
    ),
    action(
        "tttendround",
        "End the TTT round",
        Privileged,
        &[SERVER],
        relay(
            "TTTEndRound",
            "TTT round ended on {server_name}.",
            "Failed to end TTT round on {server_name}.",
        ),
    ),
    action(
        "tttflushkarma",
        "Reset the karma of all players",
        Privileged,
        &[SERVER],
        relay(
            "TTTFlushKarma",
            "Karma reset on {server_name}.",
            "Failed to reset karma on {server_name}.",
        ),
    ),
    action(
        "tttgivecredits",
        "Give TTT credits to a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("amount", Int, "The number of credits")],
        relay(
            "TTTGiveCredits",
            "Gave {amount} credits to {unique_id} on {server_name}.",
            "Failed to give credits to {unique_id} on {server_name}.",
        ),
    ),
    action(
        "tttpausetimer",
        "Pause the TTT timer",
        Privileged,
        &[SERVER, req("paused", Bool, "Whether the timer is paused")],
        relay(
            "TTTPauseTimer",
            "TTT timer paused set to {paused} on {server_name}.",
            "Failed to change TTT timer on {server_name}.",
        ),
    ),
    action(
        "tttsetkarma",
        "Set the karma of a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("amount", Int, "The karma value")],
        relay(
            "TTTSetKarma",
            "Karma of {unique_id} set to {amount} on {server_name}.",
            "Failed to set karma of {unique_id} on {server_name}.",
        ),
    ),
    action(
        "tttsetrole",
        "Set the TTT role of a player",
        Privileged,
        &[SERVER, UNIQUE_ID, req("role", Str, "The TTT role")],
        relay(
            "TTTSetRole",
            "Role of {unique_id} set to {role} on {server_name}.",
            "Failed to set role of {unique_id} on {server_name}.",
        ),
    ),
    action(
        "tttalwaysenableskinmenu",
        "Enable or disable the TTT skin menu mid-round",
        Privileged,
        &[SERVER, req("enabled", Bool, "Whether the skin menu stays available")],
        relay(
            "TTTAlwaysEnableSkinMenu",
            "Skin menu set to {enabled} on {server_name}.",
            "Failed to change skin menu on {server_name}.",
        ),
    ),
];

/// Exact-name lookup.
pub fn lookup(name: &str) -> Option<&'static ActionSpec> {
    CATALOGUE.iter().find(|a| a.name == name)
}

pub fn export() -> Vec<ActionInfo> {
    CATALOGUE.iter().map(ActionSpec::info).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_lowercase() {
        let mut seen = HashSet::new();
        for a in CATALOGUE {
            assert!(seen.insert(a.name), "duplicate action {}", a.name);
            assert_eq!(a.name, a.name.to_ascii_lowercase());
        }
    }

    #[test]
    fn server_actions_take_server_first() {
        let needs_server =
            |a: &&ActionSpec| matches!(a.handler, Handler::Relay { .. } | Handler::List { .. });
        for a in CATALOGUE.iter().filter(needs_server) {
            assert_eq!(a.args.first().map(|s| s.name), Some(SERVER_ARG), "{}", a.name);
        }
    }

    #[test]
    fn placeholders_name_real_args() {
        for a in CATALOGUE {
            let names = a.args.iter().map(|s| s.name).collect::<Vec<_>>();
            let templates: Vec<&str> = match a.handler {
                Handler::Relay { msgs, .. } => {
                    let mut v = vec![msgs.ok, msgs.failed];
                    if let Some((ok, failed)) = msgs.bare {
                        v.extend([ok, failed]);
                    }
                    v
                }
                Handler::List { shape, .. } => {
                    vec![shape.heading, shape.empty, shape.parse_failed, shape.failed]
                }
                _ => Vec::new(),
            };
            for t in templates {
                let mut rest = t;
                while let Some(i) = rest.find('{') {
                    let end = rest[i..].find('}').map(|j| i + j).unwrap();
                    let key = &rest[i + 1..end];
                    assert!(names.contains(&key), "{}: unknown placeholder {key}", a.name);
                    rest = &rest[end + 1..];
                }
            }
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert!(lookup("kick").is_some());
        assert!(lookup("Kick").is_none());
        assert!(lookup("nope").is_none());
        assert_eq!(export().len(), CATALOGUE.len());
    }
}
