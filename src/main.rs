use clap::Parser;
use shg::cli::{Cli, Commands, GlobalOpts};
use shg::core::{Config, ErrorBody};
use tracing_subscriber::EnvFilter;

fn main() {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }));

    let cli = Cli::parse();
    let config = Config::load(cli.global.workspace.as_deref());
    let global = cli.global.with_config(&config);
    init_tracing(&global, &config);
    config.emit_warnings();

    if let Err(report) = dispatch(cli.command, &global) {
        let (body, kind) = ErrorBody::from_report(&report);
        tracing::debug!(?kind, status = kind.status(), "command failed");
        if global.is_json() {
            println!("{}", body.to_json());
        } else {
            eprintln!("{:?}", report);
        }
        std::process::exit(kind.exit_code());
    }
}

fn init_tracing(global: &GlobalOpts, config: &Config) {
    let directive = if global.verbose {
        "debug".to_string()
    } else if global.quiet {
        "error".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "warn".to_string())
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn dispatch(command: Commands, global: &GlobalOpts) -> miette::Result<()> {
    match command {
        Commands::Init(args) => shg::cli::commands::init::run(args),
        Commands::Staff(cmd) => shg::cli::commands::staff::run(cmd, global),
        Commands::Cluster(cmd) => shg::cli::commands::cluster::run(cmd, global),
        Commands::Group(cmd) => shg::cli::commands::group::run(cmd, global),
        Commands::Member(cmd) => shg::cli::commands::member::run(cmd, global),
        Commands::Survey(cmd) => shg::cli::commands::survey::run(cmd, global),
        Commands::Meeting(cmd) => shg::cli::commands::meeting::run(cmd, global),
        Commands::Report(cmd) => shg::cli::commands::report::run(cmd, global),
        Commands::Completions(args) => shg::cli::commands::completions::run(args),
    }
}
