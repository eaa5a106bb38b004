use std::sync::Arc;

use clap::{Parser, Subcommand};
use slidedeck::model::{DesignId, ObjectVariant, UserId};
use slidedeck::remote::{AuthSession, Credentials, HttpStore, NoRefresh, RemoteStore};
use slidedeck::{DeckConfig, Result, SyncEngine};

#[derive(Parser, Debug)]
#[command(name = "slidedeck", about = "Inspect and edit slide deck designs")]
struct Cli {
    #[arg(long, env = "DECK_API_BASE_URL")]
    base_url: String,

    #[arg(long, env = "DECK_ACCESS_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "DECK_REFRESH_TOKEN")]
    refresh_token: Option<String>,

    #[arg(long, env = "DECK_USER_ID")]
    user_id: Option<UserId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print slides, elements and animations.
    Outline { design_id: DesignId },
    Rename { design_id: DesignId, title: String },
    Share {
        design_id: DesignId,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    Publish { design_id: DesignId },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = DeckConfig::from_env_with_base(&cli.base_url);
    let auth = Arc::new(match (cli.token, cli.user_id) {
        (Some(access_token), Some(user_id)) => AuthSession::with_credentials(Credentials {
            access_token,
            refresh_token: cli.refresh_token,
            user_id,
            name: String::new(),
            email: String::new(),
        }),
        _ => AuthSession::new(NoRefresh),
    });
    let store: Arc<dyn RemoteStore> = Arc::new(HttpStore::new(&config, Arc::clone(&auth))?);

    match cli.command {
        Command::Outline { design_id } => {
            let engine = SyncEngine::load(store, auth, &config, design_id).await?;
            print_outline(&engine);
        }
        Command::Rename { design_id, title } => {
            let mut engine = SyncEngine::load(store, auth, &config, design_id).await?;
            engine.rename_design(&title).await?;
            println!("renamed design {design_id} to {title:?}");
        }
        Command::Share { design_id, on, off } => {
            let mut engine = SyncEngine::load(store, auth, &config, design_id).await?;
            let shared = on || !off;
            engine.set_shared(shared).await?;
            println!("design {design_id} shared: {shared}");
        }
        Command::Publish { design_id } => {
            let mut engine = SyncEngine::load(store, auth, &config, design_id).await?;
            let post_id = engine.publish_post().await?;
            println!("design {design_id} published as post {post_id}");
        }
    }
    Ok(())
}

fn print_outline(engine: &SyncEngine) {
    let doc = engine.document();
    let shared = if doc.shared { "shared" } else { "private" };
    println!("{} (#{}, {shared}, {} slides)", doc.title, doc.id, doc.slide_count());
    for (index, slide) in doc.slides().iter().enumerate() {
        println!("  slide {index} #{}: {} elements", slide.id, slide.elements().len());
        for element in slide.elements() {
            let detail = match &element.object {
                ObjectVariant::Shape(s) => format!("shape {}", s.fill_color),
                ObjectVariant::TextBox(t) => format!("text {:?}", t.text),
                ObjectVariant::Image(i) => format!("image {}", i.source_url),
                ObjectVariant::Spatial(s) => format!("spatial {} models, {} frames", s.models.len(), s.frames.len()),
                ObjectVariant::Invalid => "invalid".to_owned(),
            };
            println!(
                "    z={:<3} #{} {detail} at ({:.0}, {:.0}) {:.0}x{:.0}",
                element.z, element.id, element.position.x, element.position.y, element.size.x, element.size.y
            );
        }
        for animation in slide.animations() {
            println!(
                "    anim #{} {:?} {:?} on #{} ({} ms)",
                animation.id, animation.effect, animation.timing, animation.target, animation.duration_ms
            );
        }
    }
}
