use eframe::egui;
use egui_expanding_tree::description::find;
use egui_expanding_tree::{ExpandingTree, ExpandingTreeEvent, Theme, ThemeBroadcaster, TreeConfigPatch};
use serde_json::{json, Value};
use std::fs;

const SAMPLE_CONFIG: &str = include_str!("../data/sample.json");

fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Expanding Tree Example",
        native_options,
        Box::new(|cc| Ok(Box::new(ExpandingTreeApp::new(&cc.egui_ctx)))),
    )
}

struct ExpandingTreeApp {
    themes: ThemeBroadcaster,
    tree: ExpandingTree,
    /// 同一份数据，使用 `title` 字段作为标签
    remapped_tree: ExpandingTree,
    status_message: String,
}

impl ExpandingTreeApp {
    fn new(ctx: &egui::Context) -> Self {
        let mut themes = ThemeBroadcaster::new(Theme::Light);
        ctx.set_visuals(themes.current().visuals());

        let sample: Value = serde_json::from_str(SAMPLE_CONFIG).unwrap_or_else(|e| {
            log::error!("Failed to parse bundled sample: {}", e);
            json!({})
        });

        let mut tree = ExpandingTree::new();
        if let Err(e) = tree.configure(sample.clone()) {
            log::warn!("Sample configuration rejected: {}", e);
        }
        tree.attach_theme(themes.subscribe());

        let mut remapped_tree = ExpandingTree::new();
        let titled: Vec<Value> = tree
            .config()
            .data
            .iter()
            .map(|record| {
                let mut record = record.clone();
                let label = record["label"].as_str().unwrap_or_default().to_uppercase();
                record["title"] = Value::String(label);
                record
            })
            .collect();
        if let Err(e) = remapped_tree.configure(json!({ "labelKey": "title", "data": titled })) {
            log::warn!("Remapped configuration rejected: {}", e);
        }
        remapped_tree.attach_theme(themes.subscribe());

        Self {
            themes,
            tree,
            remapped_tree,
            status_message: "Loaded bundled sample data".to_string(),
        }
    }

    fn open_data_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Open Tree Configuration")
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            let result = TreeConfigPatch::load_from_path(&path)
                .and_then(|patch| self.tree.configure_with(patch));
            match result {
                Ok(()) => {
                    self.status_message = format!("Loaded: {:?}", path);
                    log::info!("Loaded tree configuration: {:?}", path);
                }
                Err(e) => {
                    self.status_message = format!("Failed to load {:?}: {}", path, e);
                    log::error!("Failed to load tree configuration: {}", e);
                }
            }
        }
    }

    fn export_html(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Export HTML")
            .add_filter("HTML", &["html"])
            .set_file_name("tree.html")
            .save_file()
        {
            match fs::write(&path, self.tree.to_html()) {
                Ok(()) => {
                    self.status_message = format!("Exported to: {:?}", path);
                    log::info!("Exported tree HTML: {:?}", path);
                }
                Err(e) => {
                    self.status_message = format!("Export failed: {}", e);
                    log::error!("Failed to export tree HTML: {}", e);
                }
            }
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        let theme = self.themes.toggle();
        ctx.set_visuals(theme.visuals());
        self.status_message = format!("Theme: {}", theme);
    }

    fn handle_events(&mut self, remapped: bool, events: Vec<ExpandingTreeEvent>) {
        for event in events {
            match &event {
                ExpandingTreeEvent::NodeToggled { id, open } => {
                    let forest = if remapped {
                        self.remapped_tree.forest()
                    } else {
                        self.tree.forest()
                    };
                    let label = find(forest, id)
                        .map(|node| node.label.clone())
                        .unwrap_or_else(|| id.clone());
                    self.status_message = format!(
                        "{} (#{}) {}",
                        label,
                        id,
                        if *open { "expanded" } else { "collapsed" }
                    );
                }
                ExpandingTreeEvent::ThemeApplied { theme } => {
                    log::debug!("Tree theme applied: {}", theme);
                }
            }
            log::info!("[ExpandingTreeEvent] {:?}", event);
        }
    }
}

impl eframe::App for ExpandingTreeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 顶部菜单栏
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Data...").clicked() {
                        self.open_data_file();
                        ui.close_menu();
                    }
                    if ui.button("Export HTML...").clicked() {
                        self.export_html();
                        ui.close_menu();
                    }
                });
                let toggle_label = match self.themes.current() {
                    Theme::Light => "🌙 Dark",
                    Theme::Dark => "☀ Light",
                };
                if ui.button(toggle_label).clicked() {
                    self.toggle_theme(ctx);
                }
            });
        });

        // 底部状态栏
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
            });
        });

        egui::SidePanel::right("remapped_tree")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("labelKey = title");
                egui::ScrollArea::vertical()
                    .id_salt("remapped_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let events = self.remapped_tree.ui(ui);
                        self.handle_events(true, events);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Tree");
            egui::ScrollArea::vertical()
                .id_salt("tree_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let events = self.tree.ui(ui);
                    self.handle_events(false, events);
                });
        });
    }
}
