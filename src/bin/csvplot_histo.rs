use csvplot_lpp::config::{load_config, HistoConfig};
use csvplot_lpp::histo::{parse_cli, run};
use log::{error, info};

fn main() {
    csvplot_lpp::init_logger();
    let config_path = parse_cli();
    info!("read configuration from {}", config_path.display());
    let config: HistoConfig = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    match run(&config) {
        Ok(written) => info!("done, {} figure(s) written", written.len()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
