use anyhow::Result;
use clap::Args;
use rsvp_index::IndexClient;
use rsvp_utils::env::RSVP_INDEX_URL_ENV_VAR;
use tracing::trace;
use url::Url;

use super::required;

#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Index options")]
pub struct IndexOptions {
    #[arg(long, env = RSVP_INDEX_URL_ENV_VAR)]
    #[arg(value_name = "URL")]
    #[arg(help = "GraphQL endpoint of the subgraph indexing the registry.")]
    #[arg(global = true)]
    pub index_url: Option<Url>,
}

impl IndexOptions {
    pub fn client(&self) -> Result<IndexClient> {
        let url = required(self.index_url.clone(), "index-url", RSVP_INDEX_URL_ENV_VAR)?;
        trace!(%url, "Creating IndexClient.");
        Ok(IndexClient::new(url))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(clap::Parser)]
    struct Command {
        #[clap(flatten)]
        options: IndexOptions,
    }

    #[test]
    fn url_read_from_env_variable() {
        const ENV_URL: &str = "http://localhost:8000/subgraphs/name/rsvp";
        std::env::set_var(RSVP_INDEX_URL_ENV_VAR, ENV_URL);

        let cmd = Command::parse_from(["rsvp"]);
        assert_eq!(cmd.options.client().unwrap().url().as_str(), ENV_URL);
    }
}
