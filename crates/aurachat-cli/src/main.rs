//! AuraChat CLI - command-line shell over the client core
//!
//! Stands in for the UI layer: constructs the managers explicitly, runs the
//! startup reconciliation, invokes one operation, and prints the outcome.

use std::env;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::debug;

use aurachat_core::api::types::ProfileUpdate;
use aurachat_core::api::ApiClient;
use aurachat_core::config::Config;
use aurachat_core::domain::session::{SessionManager, UserPatch};
use aurachat_core::domain::theme::{SystemThemeProbe, Theme, ThemeManager, ThemeTarget};
use aurachat_core::storage::{FileStore, KeyValueStore};

#[derive(Parser)]
#[command(name = "aurachat")]
#[command(author, version, about = "AuraChat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account and log in
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Log in with username and password
    Login { username: String, password: String },

    /// Log out and clear the local session
    Logout,

    /// Start a local demo session (no backend required)
    Demo {
        /// Display name for the demo user
        name: Option<String>,
    },

    /// Show the current session
    Whoami,

    /// Profile operations
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Change the account password
    Password {
        current_password: String,
        new_password: String,
    },

    /// Show a page of the post feed
    Feed {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Create a post
    Post {
        content: String,
        /// Optional image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Theme operations
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the current profile
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the resolved theme
    Show,
    /// Set an explicit theme preference (light or dark)
    Set { theme: String },
    /// Flip between light and dark
    Toggle,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
}

/// System-theme probe driven by the `AURACHAT_SYSTEM_THEME` variable
///
/// Terminals have no portable appearance query, so the probe reads an
/// environment variable the desktop session can export.
struct EnvProbe;

impl SystemThemeProbe for EnvProbe {
    fn detect(&self) -> Option<Theme> {
        env::var("AURACHAT_SYSTEM_THEME")
            .ok()
            .as_deref()
            .and_then(Theme::from_str)
    }
}

/// Theme sink for the terminal shell
struct TerminalTheme;

impl ThemeTarget for TerminalTheme {
    fn apply(&self, theme: Theme) {
        debug!(theme = %theme, "Applied theme to terminal shell");
    }
}

struct App {
    client: ApiClient,
    session: SessionManager,
    theme: ThemeManager,
}

impl App {
    fn build() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open_default()?);
        let client = ApiClient::new(&config.api, store.clone())?;
        let session = SessionManager::new(Arc::new(client.clone()), store.clone());
        let theme = ThemeManager::new(store, Arc::new(EnvProbe), Arc::new(TerminalTheme));
        Ok(Self {
            client,
            session,
            theme,
        })
    }

    async fn initialize(&self) {
        self.session.initialize().await;
        self.theme.initialize().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aurachat=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let app = App::build()?;
            app.initialize().await;
            let outcome = app.session.register(&username, &email, &password).await;
            match outcome.user() {
                Some(user) => println!("Registered and logged in as {}", user.username),
                None => bail!("{}", outcome.error().unwrap_or("Registration failed")),
            }
        }

        Commands::Login { username, password } => {
            let app = App::build()?;
            app.initialize().await;
            let outcome = app.session.login(&username, &password).await;
            match outcome.user() {
                Some(user) => println!("Logged in as {}", user.username),
                None => bail!("{}", outcome.error().unwrap_or("Login failed")),
            }
        }

        Commands::Logout => {
            let app = App::build()?;
            app.initialize().await;
            app.session.logout().await;
            println!("Logged out");
        }

        Commands::Demo { name } => {
            let app = App::build()?;
            app.initialize().await;
            let outcome = app.session.demo_login(name.as_deref()).await;
            if let Some(user) = outcome.user() {
                println!("Demo session started as {}", user.username);
            }
        }

        Commands::Whoami => {
            let app = App::build()?;
            app.initialize().await;
            match app.session.current_user() {
                Some(user) if user.is_demo => {
                    println!("{} <{}> (demo session)", user.username, user.email)
                }
                Some(user) => println!("{} <{}>", user.username, user.email),
                None => println!("Not logged in"),
            }
        }

        Commands::Profile { action } => {
            let app = App::build()?;
            app.initialize().await;
            require_session(&app)?;
            match action {
                ProfileAction::Show => {
                    let user = app.client.get_profile().await?;
                    println!("{} <{}>", user.username, user.email);
                    if let Some(full_name) = &user.full_name {
                        println!("  name: {}", full_name);
                    }
                    if let Some(bio) = &user.bio {
                        println!("  bio: {}", bio);
                    }
                    println!(
                        "  followers: {}  following: {}  posts: {}",
                        user.followers, user.following, user.posts
                    );
                }
                ProfileAction::Update {
                    full_name,
                    bio,
                    location,
                    website,
                    avatar_url,
                } => {
                    let update = ProfileUpdate {
                        full_name: full_name.clone(),
                        bio: bio.clone(),
                        location,
                        website,
                        avatar_url: avatar_url.clone(),
                        theme_preference: None,
                    };
                    if app.session.current_user().is_some_and(|u| u.is_demo) {
                        // Demo sessions have no backend; patch locally only
                        app.session
                            .update_user(UserPatch {
                                full_name,
                                bio,
                                profile_picture: avatar_url,
                                ..Default::default()
                            })
                            .await;
                        println!("Demo profile updated locally");
                    } else {
                        app.client.update_profile(&update).await?;
                        app.session
                            .update_user(UserPatch {
                                full_name: update.full_name,
                                bio: update.bio,
                                profile_picture: update.avatar_url,
                                ..Default::default()
                            })
                            .await;
                        println!("Profile updated");
                    }
                }
            }
        }

        Commands::Password {
            current_password,
            new_password,
        } => {
            let app = App::build()?;
            app.initialize().await;
            require_session(&app)?;
            app.client
                .change_password(&current_password, &new_password)
                .await?;
            println!("Password changed");
        }

        Commands::Feed { page } => {
            let app = App::build()?;
            app.initialize().await;
            let feed = app.client.feed(page).await?;
            if feed.posts.is_empty() {
                println!("No posts");
            }
            for post in &feed.posts {
                let author = post.author_username.as_deref().unwrap_or("unknown");
                println!("@{}: {}", author, post.content);
                println!("  likes: {}  comments: {}", post.likes, post.comments);
            }
            if feed.pages > 0 {
                println!("Page {} of {}", feed.current_page, feed.pages);
            }
        }

        Commands::Post { content, image } => {
            let app = App::build()?;
            app.initialize().await;
            require_session(&app)?;
            let post = app.client.create_post(&content, image.as_deref()).await?;
            println!("Posted #{}", post.id);
        }

        Commands::Theme { action } => {
            let app = App::build()?;
            app.initialize().await;
            match action {
                ThemeAction::Show => println!("{}", app.theme.theme()),
                ThemeAction::Set { theme } => {
                    let Some(theme) = Theme::from_str(&theme) else {
                        bail!("Unknown theme: {}. Valid options: light, dark", theme);
                    };
                    app.theme.set_preference(theme).await;
                    println!("Theme set to {}", app.theme.theme());
                }
                ThemeAction::Toggle => {
                    app.theme.toggle_theme().await;
                    println!("Theme set to {}", app.theme.theme());
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                let config = Config::load()?;
                println!("{}", config.get(&key)?);
            }
            ConfigAction::Set { key, value } => {
                let mut config = Config::load()?;
                config.set(&key, &value)?;
                config.save()?;
                println!("{} = {}", key, config.get(&key)?);
            }
            ConfigAction::List => {
                let config = Config::load()?;
                for (key, value) in config.list()? {
                    println!("{} = {}", key, value);
                }
            }
        },
    }

    Ok(())
}

fn require_session(app: &App) -> anyhow::Result<()> {
    if !app.session.is_authenticated() {
        bail!("Not logged in. Run `aurachat login` or `aurachat demo` first.");
    }
    Ok(())
}
