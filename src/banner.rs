//! Startup banner.

use crate::config::AppConfig;

/// Print the boot banner with the instance's vital signs.
pub fn print_banner(config: &AppConfig) {
    println!("==================================================");
    println!("Honeycomb instance: {}", config.instance.instance_name);
    println!("  id:       {}", config.instance.instance_id);
    println!("  url:      {}", config.instance.instance_url);
    println!("  version:  {}", config.instance.version);
    println!("  gateway:  {}:{}", config.network.bind_addr, config.network.port);
    println!("  registry: {}:{}", config.network.bind_addr, config.network.registry_port);
    match &config.store.url {
        Some(url) => println!("  store:    {} ({})", url, config.store.database),
        None => println!("  store:    in-memory ({})", config.store.database),
    }
    println!("==================================================");
    println!();
}
