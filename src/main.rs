use clap::Parser;
use std::path::PathBuf;
use std::process;
use visualforge::{
    logger::{self, LogLevel, LoggerConfig},
    AspectRatio, FalClient, FalConfig, FormState, SessionController, SessionStatus, Style,
};

#[derive(Debug, Parser)]
#[command(name = "visualforge", version, about = "Generate ad creatives with fal.ai")]
struct Cli {
    /// What the image should show
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// What the image should avoid
    #[arg(short, long, default_value = "")]
    negative_prompt: String,

    #[arg(short, long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    #[arg(short, long, default_value = "auto")]
    style: Style,

    /// Send the prompt as written, without service-side enhancement
    #[arg(long)]
    no_expand_prompt: bool,

    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<i64>,

    #[arg(long)]
    random_seed: bool,

    /// Directory to write the generated image into
    #[arg(long)]
    download: Option<PathBuf>,

    /// Keep the result in the in-memory gallery and print it
    #[arg(long)]
    save: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long)]
    json_logs: bool,

    /// Print the aspect ratio and style catalogs and exit
    #[arg(long)]
    list_options: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    let logger_config = if cli.json_logs {
        LoggerConfig::production().with_level(level)
    } else {
        LoggerConfig::development().with_level(level)
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    if cli.list_options {
        print_catalogs();
        return Ok(());
    }

    let client = match FalClient::new(FalConfig::from_env()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize fal client: {}", e);
            return Err(e.into());
        }
    };
    log::info!("🖼️  Using model {}", client.queue().model_id());

    let mut controller = SessionController::new(client);
    *controller.form_mut() = FormState::new(cli.prompt)
        .with_negative_prompt(cli.negative_prompt)
        .with_aspect_ratio(cli.aspect_ratio)
        .with_style(cli.style)
        .with_expand_prompt(!cli.no_expand_prompt)
        .with_seed(cli.seed);
    if cli.random_seed {
        let seed = controller.form_mut().randomize_seed();
        println!("Seed: {}", seed);
    }

    if let Err(e) = controller.submit() {
        eprintln!("{}", e);
        process::exit(2);
    }

    let mut printed = 0;
    while controller.session().is_in_flight() {
        let Some(event) = controller.next_event().await else {
            break;
        };
        controller.apply(event);
        for message in &controller.session().progress_log()[printed..] {
            println!("… {}", message);
        }
        printed = controller.session().progress_log().len();
    }

    match controller.session().status() {
        SessionStatus::Succeeded => {
            if let Some(url) = controller.full_size_url() {
                println!("Image: {}", url);
            }
            if let Some(request_id) = controller.session().request_id() {
                println!("Request: {}", request_id);
            }
        }
        _ => {
            eprintln!(
                "{}",
                controller
                    .session()
                    .error_message()
                    .unwrap_or(visualforge::GENERATION_FAILED_MESSAGE)
            );
            process::exit(1);
        }
    }

    if cli.save {
        if let Some(saved) = controller.save() {
            println!(
                "Saved creative {} ({} / {})",
                saved.id, saved.aspect_ratio, saved.style
            );
        }
    }

    if let Some(dir) = cli.download {
        match controller.download(&dir).await {
            Ok(path) => println!("Downloaded: {}", path.display()),
            Err(e) => {
                log::error!("❌ Download failed: {}", e);
                eprintln!("Failed to download image: {}", e);
                process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_catalogs() {
    println!("Aspect ratios:");
    for ratio in AspectRatio::ALL {
        println!("  {:<6} {:<20} {}", ratio.as_str(), ratio.label(), ratio.description());
    }
    println!("Styles:");
    for style in Style::ALL {
        println!("  {:<10} {:<10} {}", style.as_str(), style.label(), style.description());
    }
}
