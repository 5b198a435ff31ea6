use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = match polycube_count::config::Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", polycube_count::config::Config::USAGE);
            return Err(err.into());
        }
    };
    config.install_thread_pool()?;

    tracing::info!(
        n = config.max_size,
        dimension = %config.dimension,
        fork_depth = config.fork_depth,
        threads = rayon::current_num_threads(),
        "enumerating"
    );

    let now = std::time::Instant::now();
    let results = polycube_count::run(&config);
    let time = now.elapsed();

    println!("results:\n{results}");
    println!("total time: {:?}", time);

    let (fixed, free) = results.average_rate(time);
    println!("performance: {fixed:.0} fixed/s, {free:.0} free/s");

    if let Some(path) = &config.json {
        use nanoserde::SerJson;

        std::fs::write(path, results.serialize_json())?;
        tracing::info!(path = %path.display(), "wrote results");
    }

    Ok(())
}
