pub mod cape;
pub mod player;
pub mod server;
pub mod skin;

use cape::*;
use regex::Regex;
use server::*;
use skin::*;

use crate::{BaristaContext, Error};

#[poise::command(prefix_command, slash_command,
    subcommands("skin", "cape", "server"),
    discard_spare_arguments,
    description_localized("en-US", "Fetch data about Minecraft players and servers."),
    aliases("mc"),
    identifying_name = "Minecraft"
)]
pub async fn minecraft(_ctx: BaristaContext<'_>) -> Result<(), Error> {
    Ok(())
}

fn parse_input(host: &str, port: Option<u16>) -> Result<String, Error> {
    let input_host: String;
    let input_port: String;

    // Check the input parameters
    let split = host.split(':').collect::<Vec<&str>>();

    if split.len() == 1 {
        input_host = split[0].to_string();
        input_port = port.unwrap_or(25565).to_string();
    } else if split.len() == 2 {
        input_host = split[0].to_string();
        input_port = split[1].to_string();
    } else {
        return Err("Invalid hostname, please try again.".into());
    }

    // Bound check our port
    let input_port = input_port.parse::<u16>();

    if input_port.is_err() {
        return Err("Invalid port, please try again.".into())
    }

    let input_port = input_port.unwrap();

    Ok(format!("{input_host}:{input_port}"))
}

/// Strip the legacy `§x` color and style codes servers put in MOTDs.
fn strip_formatting(text: &str) -> String {
    Regex::new(r"(?i)\u{a7}[0-9a-fk-or]")
        .unwrap()
        .replace_all(text, "")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_the_default_port() {
        assert_eq!(parse_input("mc.example.com", None).unwrap(), "mc.example.com:25565");
    }

    #[test]
    fn explicit_ports_win() {
        assert_eq!(parse_input("mc.example.com", Some(1234)).unwrap(), "mc.example.com:1234");
        assert_eq!(parse_input("mc.example.com:8080", None).unwrap(), "mc.example.com:8080");
    }

    #[test]
    fn bad_hosts_and_ports_are_rejected() {
        assert!(parse_input("a:b:c", None).is_err());
        assert!(parse_input("mc.example.com:99999", None).is_err());
        assert!(parse_input("mc.example.com:owo", None).is_err());
    }

    #[test]
    fn formatting_codes_are_stripped() {
        assert_eq!(strip_formatting("§6§lGolden §rserver"), "Golden server");
        assert_eq!(strip_formatting("plain"), "plain");
        assert_eq!(strip_formatting("§Kobfuscated§R"), "obfuscated");
    }
}
