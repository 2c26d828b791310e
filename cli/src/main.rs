mod commands;
mod inputs;

use anyhow::{Result, bail};
use exodus_config::ExodusConfig;
use exodus_core::TokenMappingEntry;
use std::env;
use std::path::Path;

use inputs::{parse_address, parse_asset, parse_b256, parse_hex_bytes, parse_role, parse_u256};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let cmd = args[1].as_str();
    match cmd {
        "help" | "--help" | "-h" => print_usage(),
        "sample-config" => print!("{}", ExodusConfig::generate_sample()),
        _ => {
            if let Err(e) = run(cmd, &args[2..]) {
                eprintln!("❌ Error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Fail with the usage line unless exactly `n` arguments were given.
fn expect_args(args: &[String], n: usize, usage: &str) -> Result<()> {
    if args.len() != n {
        bail!("Usage: exodus {usage}");
    }
    Ok(())
}

fn run(cmd: &str, args: &[String]) -> Result<()> {
    // Stateless checks need no config
    match cmd {
        "verify-vault" => {
            expect_args(args, 1, "verify-vault <proof.json>")?;
            return commands::verify_vault(Path::new(&args[0]));
        }
        "verify-account" => {
            expect_args(
                args,
                4,
                "verify-account <owner_key> <address> <account_root> <proof.json>",
            )?;
            return commands::verify_account(
                parse_u256(&args[0])?,
                parse_address(&args[1])?,
                parse_b256(&args[2])?,
                Path::new(&args[3]),
            );
        }
        _ => {}
    }

    let config = ExodusConfig::load()?;

    match cmd {
        "init" => commands::init(&config),
        "status" => commands::status(&config),
        "set-vault-root" => {
            expect_args(args, 2, "set-vault-root <caller> <root>")?;
            commands::set_vault_root(&config, parse_address(&args[0])?, parse_u256(&args[1])?)
        }
        "set-account-root" => {
            expect_args(args, 2, "set-account-root <caller> <root>")?;
            commands::set_account_root(&config, parse_address(&args[0])?, parse_b256(&args[1])?)
        }
        "register-token" => {
            expect_args(
                args,
                4,
                "register-token <caller> <legacy_asset_id> <asset|native> <quantum>",
            )?;
            let entry = TokenMappingEntry {
                legacy_asset_id: parse_u256(&args[1])?,
                asset: parse_asset(&args[2])?,
                quantum: parse_u256(&args[3])?,
            };
            commands::register_token(&config, parse_address(&args[0])?, entry)
        }
        "pause" | "unpause" => {
            expect_args(args, 1, &format!("{cmd} <caller>"))?;
            commands::set_paused(&config, parse_address(&args[0])?, cmd == "pause")
        }
        "grant-role" | "revoke-role" => {
            expect_args(args, 3, &format!("{cmd} <caller> <account> <role>"))?;
            commands::change_role(
                &config,
                parse_address(&args[0])?,
                parse_address(&args[1])?,
                parse_role(&args[2])?,
                cmd == "grant-role",
            )
        }
        "mint" => {
            expect_args(args, 3, "mint <asset|native> <holder> <amount>")?;
            commands::mint_to(
                &config,
                parse_asset(&args[0])?,
                parse_address(&args[1])?,
                parse_u256(&args[2])?,
            )
        }
        "fund" => {
            expect_args(args, 3, "fund <from> <asset|native> <amount>")?;
            commands::fund(
                &config,
                parse_address(&args[0])?,
                parse_asset(&args[1])?,
                parse_u256(&args[2])?,
            )
        }
        "withdraw" => {
            expect_args(
                args,
                4,
                "withdraw <caller> <recipient> <account_proof.json> <vault_proof.json>",
            )?;
            commands::withdraw(
                &config,
                parse_address(&args[0])?,
                parse_address(&args[1])?,
                Path::new(&args[2]),
                Path::new(&args[3]),
            )
        }
        "processed" => {
            expect_args(args, 2, "processed <owner_key> <asset_id>")?;
            commands::processed(&config, parse_u256(&args[0])?, parse_u256(&args[1])?)
        }
        "relay" => {
            expect_args(args, 3, "relay <chain> <source_address> <payload_hex>")?;
            commands::relay(&config, &args[0], &args[1], &parse_hex_bytes(&args[2])?)
        }
        _ => {
            print_usage();
            bail!("Unknown command: {cmd}")
        }
    }
}

fn print_usage() {
    println!("Exodus CLI - Proof-gated withdrawals from the legacy ledger");
    println!();
    println!("USAGE:");
    println!("  exodus <command> [args]");
    println!();
    println!("SETUP COMMANDS:");
    println!("  sample-config                         Print a sample exodus.toml");
    println!("  init                                  Create the processor from config");
    println!("  status                                Show roots, registry and claim count");
    println!();
    println!("VERIFICATION COMMANDS:");
    println!("  verify-vault <proof.json>             Check a vault proof offline");
    println!("  verify-account <owner> <addr> <root> <proof.json>");
    println!("                                        Check an account binding offline");
    println!();
    println!("ADMIN COMMANDS:");
    println!("  set-vault-root <caller> <root>");
    println!("  set-account-root <caller> <root>");
    println!("  register-token <caller> <asset_id> <asset|native> <quantum>");
    println!("  pause <caller> | unpause <caller>");
    println!("  grant-role <caller> <account> <role>");
    println!("  revoke-role <caller> <account> <role>");
    println!("  relay <chain> <source> <payload_hex>  Apply a relayed vault root");
    println!();
    println!("FUNDS COMMANDS:");
    println!("  mint <asset|native> <holder> <amount> Credit an address directly");
    println!("  fund <from> <asset|native> <amount>   Move funds into processor reserves");
    println!("  withdraw <caller> <recipient> <account_proof.json> <vault_proof.json>");
    println!("  processed <owner_key> <asset_id>      Show whether a claim was paid");
    println!();
    println!("ROLES:");
    println!("  pause, unpause, disburse, set_account_root, set_vault_root,");
    println!("  manage_token_mappings, admin");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("  EXODUS_CONFIG              Path to exodus.toml");
    println!("  EXODUS_DB_PATH             Database path");
    println!("  EXODUS_PROCESSOR_ADDRESS   Processor address used at init");
    println!("  EXODUS_ADMIN               Admin address used at init");
    println!("  EXODUS_ALLOW_ROOT_OVERRIDE Allow replacing set roots");
    println!("  EXODUS_RELAY_ADDRESS       Identity used by the root relay");
    println!("  RUST_LOG                   Log level (debug/info/warn/error)");
}
