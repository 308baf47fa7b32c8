use log::*;

use std::io::{Error, ErrorKind};

use pollbox::config::Config;
use pollbox::store::Store;
use pollbox::{urls, AppState};

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    pretty_env_logger::init();

    let config = Config::from_env().map_err(|err| {
        error!("Invalid configuration: {}", err);
        Error::new(ErrorKind::Other, err)
    })?;

    match Store::connect(&config).await {
        Ok(store) => {
            let state = AppState::new(store).map_err(|err| {
                error!("Could not compile templates! {:?}", err);
                Error::new(ErrorKind::Other, err.to_string())
            })?;
            let app = urls::app(state);
            info!("Listening on {}", config.listen_addr);
            app.listen(config.listen_addr).await?;
            Ok(())
        }
        Err(err) => {
            error!("Could not initialize pool! {:?}", err);
            Err(Error::new(ErrorKind::Other, err))
        }
    }
}
