use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{self, TokenType};
use crate::cli::utils::output;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(help = "User id to put in the token subject")]
    pub user_id: Uuid,

    #[arg(long, help = "Mint a refresh token instead of an access token")]
    pub refresh: bool,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let token_type = if args.refresh { TokenType::Refresh } else { TokenType::Access };
    let token = auth::generate_token(args.user_id, token_type)?;
    let expires_in = auth::token_ttl(token_type).num_seconds();

    match output_format {
        OutputFormat::Text => {
            // Bare token so it can be captured with $(notes token ...)
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output(
            &output_format,
            true,
            "Token generated",
            Some(json!({
                "token": token,
                "type": token_type,
                "user_id": args.user_id,
                "expires_in": expires_in,
            })),
        ),
    }
}
