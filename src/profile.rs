//! Profile menus and their handlers.
//!
//! Each profile contributes its own sections and registers a handler for
//! every item it creates. Discovered modules and config-defined items are
//! folded in before the controller exists; anything carrying a `command`
//! attribute without a dedicated handler gets the generic command handler.

use std::fs;
use std::time::Duration;

use humansize::{BINARY, format_size};

use crate::command::{CommandSpec, SystemRunner};
use crate::config::{Config, Target};
use crate::discovery::{discover_modules, module_path, module_stats};
use crate::error::{ConsoleError, HandlerError};
use crate::net::{Probe, probe_connectivity};
use crate::tui::registry::{ActionRegistry, Control, Session};
use crate::tui::run::Tui;
use crate::tui::state::{App, Connectivity, Menu, OptionMenu};
use crate::types::{META_COMMAND, MenuItem, MenuSection, Profile};

/// File under the project root holding the deployed version.
pub const VERSION_FILE: &str = "VERSION";

const META_SERVICE: &str = "service";
const META_HOST: &str = "host";

type HandlerResult = Result<Control, HandlerError>;

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Build the menu and handler registry for a profile.
///
/// # Errors
/// Returns an error if module discovery fails or the menu ends up empty.
pub fn build(profile: Profile, config: &Config) -> Result<(Menu, ActionRegistry), ConsoleError> {
    let mut registry = ActionRegistry::new();

    let mut sections = match profile {
        Profile::Dev => dev_sections(config, &mut registry)?,
        Profile::Manager => manager_sections(config, &mut registry),
        Profile::Server => server_sections(config, &mut registry),
        Profile::Client => client_sections(config, &mut registry)?,
    };
    let session = session_section(profile, config, &mut registry);
    let custom = custom_sections(profile, config, &sections, &session);
    sections.extend(custom);
    sections.push(session);

    let menu = Menu::new(sections);
    if menu.is_empty() {
        return Err(ConsoleError::EmptyMenu {
            profile: profile.to_string(),
        });
    }

    for item in menu.items() {
        if item.command().is_some() && !registry.contains(&item.id) {
            registry.register(item.id.clone(), run_item_command);
        }
    }

    tracing::debug!(profile = %profile, handlers = registry.len(), "menu built");
    Ok((menu, registry))
}

/// Build a ready-to-run console for a profile.
pub fn build_console(profile: Profile, config: &Config) -> Result<Tui, ConsoleError> {
    let (menu, registry) = build(profile, config)?;
    let app = App::new(profile, project_version(config), menu);
    tracing::info!(profile = %profile, root = %config.project_root.display(), "console ready");

    Ok(Tui::new(app, registry, Box::new(SystemRunner), config.project_root.clone())
        .with_probe(Probe::from_config(&config.network)))
}

/// Project version from the `VERSION` file, else the console's own.
pub fn project_version(config: &Config) -> String {
    fs::read_to_string(config.project_root.join(VERSION_FILE))
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

// ============================================================================
// PROFILE SECTIONS
// ============================================================================

fn command_item(id: &str, label: &str, icon: &str, description: &str, command: &str) -> MenuItem {
    MenuItem::new(id, label)
        .icon(icon)
        .description(description)
        .with_meta(META_COMMAND, command)
}

fn dev_sections(config: &Config, registry: &mut ActionRegistry) -> Result<Vec<MenuSection>, ConsoleError> {
    let development = MenuSection::new("development", "Development", "🛠")
        .item(command_item("git:status", "Git status", "🌿", "Working tree and branch state", "git status --short --branch"))
        .item(command_item("git:log", "Git log", "📜", "Last 20 commits", "git log --oneline --decorate -n 20"))
        .item(command_item("git:diff", "Diff stat", "±", "Uncommitted changes by file", "git diff --stat"))
        .item(command_item("git:branches", "Branches", "🔀", "Local and remote branches", "git branch -a"));

    let modules = modules_section(config, registry)?;

    let system = MenuSection::new("system", "System", "🖥")
        .item(command_item("sys:disk", "Disk usage", "💾", "Free space on the project volume", "df -h ."))
        .item(version_item(config, registry));

    Ok(vec![development, modules, system])
}

fn manager_sections(config: &Config, registry: &mut ActionRegistry) -> Vec<MenuSection> {
    let mut targets = MenuSection::new("targets", "Targets", "🎯");
    if config.manager.targets.is_empty() {
        targets = targets.item(
            MenuItem::new("target:none", "No targets configured")
                .description("Add [[manager.targets]] entries to the config file.")
                .enabled(false),
        );
    }
    for target in &config.manager.targets {
        let id = format!("target:{}", target.name);
        registry.register(id.clone(), options_handler(target_actions(target)));
        targets = targets.item(
            MenuItem::new(id, target.name.clone())
                .icon("🖧")
                .description(format!("{} ({})", target.host, target.service))
                .with_meta(META_HOST, target.host.clone())
                .with_meta(META_SERVICE, target.service.clone()),
        );
    }

    let versions = MenuSection::new("versions", "Versions", "🏷")
        .item(command_item("versions:tags", "Release tags", "🏷", "Tags, newest first", "git tag --sort=-creatordate"))
        .item(command_item("versions:head", "Current commit", "📍", "Commit the working tree is on", "git log -1 --format='%h %s (%cr)'"))
        .item(version_item(config, registry));

    vec![targets, versions]
}

fn server_sections(config: &Config, registry: &mut ActionRegistry) -> Vec<MenuSection> {
    let mut services = MenuSection::new("services", "Services", "⚙");
    for name in &config.server.services {
        let id = format!("svc:{}", name);
        registry.register(id.clone(), options_handler(service_actions(name)));
        services = services.item(
            MenuItem::new(id, name.clone())
                .icon("▸")
                .description(format!("systemd unit {}", name))
                .with_meta(META_SERVICE, name.clone()),
        );
    }

    let system = MenuSection::new("system", "System", "🖥")
        .item(command_item("sys:disk", "Disk usage", "💾", "Mounted filesystems", "df -h"))
        .item(command_item("sys:memory", "Memory", "🧠", "Memory and swap", "free -h"))
        .item(command_item("sys:uptime", "Uptime", "⏱", "Uptime and load average", "uptime"));

    vec![services, system]
}

fn client_sections(config: &Config, registry: &mut ActionRegistry) -> Result<Vec<MenuSection>, ConsoleError> {
    let addr = config.network.probe_addr.clone();
    let timeout = Duration::from_millis(config.network.probe_timeout_ms);
    let enabled = !addr.is_empty();

    registry.register("client:connectivity", move |session: &mut Session<'_>, item: &MenuItem| {
        match probe_connectivity(&addr, timeout) {
            Connectivity::Online => session.set_success(item.label.clone(), format!("✓ {} is reachable", addr)),
            _ => session.set_error(item.label.clone(), format!("{} is unreachable", addr)),
        }
        Ok(Control::Continue)
    });

    let status = MenuSection::new("status", "Status", "📡")
        .item(
            MenuItem::new("client:connectivity", "Connectivity")
                .icon("🌐")
                .description(format!("TCP check against {}", config.network.probe_addr))
                .enabled(enabled),
        )
        .item(version_item(config, registry));

    let modules = modules_section(config, registry)?;
    Ok(vec![status, modules])
}

fn modules_section(config: &Config, registry: &mut ActionRegistry) -> Result<MenuSection, ConsoleError> {
    let items = discover_modules(&config.modules_path())?;
    for item in &items {
        registry.register(item.id.clone(), show_module);
    }
    Ok(MenuSection::new("modules", "Modules", "📦").items(items))
}

/// Config-defined items for this profile, grouped by section in file order.
///
/// Items whose id is already taken are skipped.
fn custom_sections(
    profile: Profile,
    config: &Config,
    existing: &[MenuSection],
    session: &MenuSection,
) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = Vec::new();

    for custom in &config.custom {
        if custom.profile.is_some_and(|p| p != profile) {
            continue;
        }
        let taken = existing
            .iter()
            .chain(std::iter::once(session))
            .chain(sections.iter())
            .flat_map(|s| s.items.iter())
            .any(|item| item.id == custom.id);
        if taken {
            tracing::warn!(id = %custom.id, "custom item id already in use; skipping");
            continue;
        }

        let item = command_item(&custom.id, &custom.label, &custom.icon, &custom.description, &custom.command);
        match sections.iter_mut().find(|s| s.label == custom.section) {
            Some(section) => section.items.push(item),
            None => {
                let id = format!("custom:{}", custom.section.to_lowercase().replace(' ', "-"));
                sections.push(MenuSection::new(id, custom.section.clone(), "★").item(item));
            }
        }
    }
    sections
}

fn session_section(profile: Profile, config: &Config, registry: &mut ActionRegistry) -> MenuSection {
    let version = project_version(config);
    let root = config.project_root.display().to_string();
    registry.register("about", move |session: &mut Session<'_>, _: &MenuItem| {
        session.set_content(
            "About",
            vec![
                "UNIBOS console".to_string(),
                String::new(),
                format!("profile:  {}", profile),
                format!("version:  {}", version),
                format!("console:  {}", env!("CARGO_PKG_VERSION")),
                format!("root:     {}", root),
            ],
        );
        Ok(Control::Continue)
    });
    registry.register("quit", |_: &mut Session<'_>, _: &MenuItem| Ok(Control::Quit));

    MenuSection::new("session", "Session", "⏻")
        .item(MenuItem::new("about", "About").icon("ℹ").description("Console and project information"))
        .item(MenuItem::new("quit", "Quit").icon("⏏").description("Leave the console"))
}

// ============================================================================
// HANDLERS
// ============================================================================

/// Run the item's `command` attribute and show its output.
fn run_item_command(session: &mut Session<'_>, item: &MenuItem) -> HandlerResult {
    let command = item.command().ok_or_else(|| HandlerError::Failed {
        item: item.id.clone(),
        reason: "no command attached".to_string(),
    })?;
    session.show_command(item.label.clone(), &CommandSpec::shell(command));
    Ok(Control::Continue)
}

fn show_module(session: &mut Session<'_>, item: &MenuItem) -> HandlerResult {
    let path = module_path(item).ok_or_else(|| HandlerError::Failed {
        item: item.id.clone(),
        reason: "module has no path".to_string(),
    })?;
    if !path.is_dir() {
        return Err(HandlerError::Failed {
            item: item.id.clone(),
            reason: format!("{} no longer exists", path.display()),
        });
    }

    let stats = module_stats(&path);
    let mut lines = Vec::new();
    if !item.description.is_empty() {
        lines.push(item.description.clone());
        lines.push(String::new());
    }
    lines.push(format!("path:   {}", path.display()));
    lines.push(format!("files:  {}", stats.files));
    lines.push(format!("size:   {}", format_size(stats.bytes, BINARY)));
    session.set_content(item.label.clone(), lines);
    Ok(Control::Continue)
}

fn version_item(config: &Config, registry: &mut ActionRegistry) -> MenuItem {
    let version = project_version(config);
    registry.register("version", move |session: &mut Session<'_>, item: &MenuItem| {
        let mut lines = vec![
            format!("project:  {}", version),
            format!("console:  {}", env!("CARGO_PKG_VERSION")),
        ];
        let describe = CommandSpec::new("git", ["describe", "--tags", "--always", "--dirty"]);
        match session.run_command(&describe) {
            Ok(output) if output.success() => {
                let (described, _) = output.into_display();
                if let Some(first) = described.first() {
                    lines.push(format!("git:      {}", first));
                }
            }
            Ok(_) | Err(_) => lines.push("git:      unavailable".to_string()),
        }
        session.set_content(item.label.clone(), lines);
        Ok(Control::Continue)
    });

    MenuItem::new("version", "Version info")
        .icon("🏷")
        .description("Project, console and git versions")
}

/// One entry of a nested option menu.
struct SubAction {
    suffix: &'static str,
    label: &'static str,
    title: String,
    spec: CommandSpec,
}

fn service_actions(name: &str) -> Vec<SubAction> {
    let systemctl = |verb: &'static str, label: &'static str| SubAction {
        suffix: verb,
        label,
        title: format!("{} {}", name, verb),
        spec: CommandSpec::new("systemctl", [verb, name]),
    };
    vec![
        systemctl("start", "Start"),
        systemctl("stop", "Stop"),
        systemctl("restart", "Restart"),
        SubAction {
            suffix: "status",
            label: "Status",
            title: format!("{} status", name),
            spec: CommandSpec::new("systemctl", ["status", name, "--no-pager"]),
        },
        SubAction {
            suffix: "logs",
            label: "Logs",
            title: format!("{} logs", name),
            spec: CommandSpec::new("journalctl", ["-u", name, "-n", "50", "--no-pager"]),
        },
    ]
}

fn target_actions(target: &Target) -> Vec<SubAction> {
    let host = target.host.as_str();
    let service = target.service.as_str();
    vec![
        SubAction {
            suffix: "ping",
            label: "Ping",
            title: format!("ping {}", host),
            spec: CommandSpec::new("ping", ["-c", "3", host]),
        },
        SubAction {
            suffix: "uptime",
            label: "Uptime",
            title: format!("{} uptime", target.name),
            spec: CommandSpec::new("ssh", [host, "uptime"]),
        },
        SubAction {
            suffix: "status",
            label: "Service status",
            title: format!("{} {} status", target.name, service),
            spec: CommandSpec::new("ssh", [host, "systemctl", "status", service, "--no-pager"]),
        },
        SubAction {
            suffix: "logs",
            label: "Recent logs",
            title: format!("{} {} logs", target.name, service),
            spec: CommandSpec::new("ssh", [host, "journalctl", "-u", service, "-n", "50", "--no-pager"]),
        },
    ]
}

/// Open an option menu whose entries each run one command in an output
/// sub-view. Entry handlers are registered on each open.
fn options_handler(
    actions: Vec<SubAction>,
) -> impl FnMut(&mut Session<'_>, &MenuItem) -> HandlerResult + 'static {
    move |session: &mut Session<'_>, item: &MenuItem| {
        let mut entries = Vec::with_capacity(actions.len());
        for action in &actions {
            let id = format!("{}:{}", item.id, action.suffix);
            let title = action.title.clone();
            let spec = action.spec.clone();
            session.register(id.clone(), move |s: &mut Session<'_>, _: &MenuItem| {
                s.show_command_view(title.as_str(), &spec);
                Ok(Control::Continue)
            });
            entries.push(MenuItem::new(id, action.label).description(format!("$ {}", action.spec.display())));
        }
        session.push_menu(OptionMenu::new(item.label.clone(), entries));
        Ok(Control::Continue)
    }
}

// ============================================================================
// TESTS
// ============================================================================
