#![forbid(unsafe_code)]
//! Wallet helper: create a key and sign ownership challenges with it

use clap::{Parser, Subcommand};
use colored::*;
use starregistry::crypto::{KeyPair, Secp256k1Verifier, SignatureVerifier};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates a new key pair
    New,
    /// Prints the address controlled by a secret key
    Address {
        /// Hex encoded secret key
        #[arg(long)]
        secret: String,
    },
    /// Signs a challenge message
    Sign {
        /// The message returned by /api/requestValidation
        message: String,
        /// Hex encoded secret key
        #[arg(long)]
        secret: String,
    },
    /// Checks a signature against an address
    Verify {
        message: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        signature: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::New => {
            let keypair = KeyPair::generate();
            println!("{}", "🔑 New key pair".bright_cyan());
            println!("  address: {}", keypair.address_hex().bright_white());
            println!("  secret:  {}", keypair.secret_hex().yellow());
            println!("{}", "Keep the secret key private.".red());
        }
        Commands::Address { secret } => {
            let keypair = KeyPair::from_secret_hex(secret)?;
            println!("{}", keypair.address_hex());
        }
        Commands::Sign { message, secret } => {
            let keypair = KeyPair::from_secret_hex(secret)?;
            println!("{}", "🖋️  Signing challenge...".bright_cyan());
            println!("  address:   {}", keypair.address_hex().bright_white());
            println!("  signature: {}", keypair.sign_message(message).bright_green());
        }
        Commands::Verify {
            message,
            address,
            signature,
        } => {
            if Secp256k1Verifier.verify(message, address, signature)? {
                println!("{}", "✅ Signature proves ownership of the address".green());
            } else {
                println!("{}", "❌ Signature does not match the address".red());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
