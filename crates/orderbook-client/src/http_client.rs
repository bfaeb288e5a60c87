use {
    reqwest::{Client, ClientBuilder},
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An HTTP client factory.
///
/// Every client talking to the order backend is built here so that they all
/// share one timeout and user agent.
#[derive(Clone, Debug)]
pub struct HttpClientFactory {
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(args: &Arguments) -> Self {
        Self {
            timeout: args.http_timeout,
        }
    }

    /// Creates a new HTTP client with the default settings.
    pub fn create(&self) -> reqwest::Result<Client> {
        self.builder().build()
    }

    /// Creates a new HTTP client, allowing for additional configuration.
    pub fn configure(
        &self,
        config: impl FnOnce(ClientBuilder) -> ClientBuilder,
    ) -> reqwest::Result<Client> {
        config(self.builder()).build()
    }

    /// Returns a `ClientBuilder` with the default settings.
    pub fn builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Command line arguments for the common HTTP factory.
#[derive(clap::Parser)]
#[group(skip)]
pub struct Arguments {
    /// Timeout for requests to the order backend.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self { http_timeout } = self;

        writeln!(f, "http_timeout: {http_timeout:?}")
    }
}
