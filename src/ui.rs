use crate::data::{preview_csv, UploadFile, UploadKind, MAX_UPLOAD_BYTES};
use crate::loader::{DashboardData, DataSource, NoticeKind, Sourced, UploadState};
use crate::models::{
    heatmap_intensity, percent, AppState, ClassifierResults, GeneExpression, GeneTableStats,
    HeatmapData, PcaData, Regulation, Tab, View, VolcanoPlotData, VolcanoPoint,
};
use crate::mock::QUICK_ACCESS_GENES;
use eframe::egui;
use eframe::egui::{Align2, Color32, FontId, RichText, Sense, Ui, Vec2};
use egui::Layout;
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use rfd::FileDialog;
use std::time::{Duration, Instant};

const SIGNIFICANT: Color32 = Color32::from_rgb(239, 68, 68);
const NON_SIGNIFICANT: Color32 = Color32::from_rgb(107, 114, 128);
const EXPRESSION: Color32 = Color32::from_rgb(59, 130, 246);
const TOAST_TTL: Duration = Duration::from_secs(5);

fn placeholder(ui: &mut Ui, title: &str, hint: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_height(160.0);
        ui.centered_and_justified(|ui| {
            ui.label(RichText::new(format!("{}\n{}", title, hint)).weak());
        });
    });
}

fn demo_badge<T>(ui: &mut Ui, slot: &Sourced<T>) {
    if slot.source == DataSource::Demo {
        ui.label(
            RichText::new(" demo data ")
                .small()
                .background_color(Color32::from_rgb(254, 243, 199))
                .color(Color32::from_rgb(146, 64, 14)),
        )
        .on_hover_text("The backend did not provide this section; example values are shown.");
    }
}

fn stat_tile(ui: &mut Ui, label: &str, value: String, color: Color32) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_width(140.0);
        ui.vertical(|ui| {
            ui.label(RichText::new(label).small());
            ui.label(RichText::new(value).size(22.0).strong().color(color));
        });
    });
}

pub fn nav_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.heading("Gene Expression Explorer");
        ui.separator();
        if ui.selectable_label(state.view == View::Home, "Home").clicked() {
            state.view = View::Home;
        }
        if state.loader.dataset_id().is_some() {
            for (view, label) in [
                (View::Dashboard, "Dashboard"),
                (View::GeneSearch, "Search"),
                (View::DatasetInfo, "Dataset Info"),
            ] {
                if ui.selectable_label(state.view == view, label).clicked() {
                    state.view = view;
                }
            }
        }

        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
            if state.loader.backend_connected() {
                ui.colored_label(Color32::from_rgb(22, 163, 74), "● backend connected");
            } else {
                ui.colored_label(NON_SIGNIFICANT, "○ demo mode");
            }
        });
    });
}

pub fn home_view(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.label(RichText::new("Gene Expression Explorer").size(32.0).strong());
        ui.label(
            "Differential expression tables, classifier metrics and expression plots for curated \
             GEO studies.",
        );
        ui.add_space(16.0);
    });

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Select Dataset");
        ui.label("Choose a gene expression dataset to begin analysis.");
        ui.horizontal(|ui| {
            demo_badge(ui, state.loader.datasets());
            if ui.small_button("⟳ refresh list").clicked() {
                state.loader.refresh_catalogue();
            }
        });

        let current = state.loader.dataset_id().map(str::to_string);
        let selected_text = current
            .as_ref()
            .and_then(|id| {
                state
                    .loader
                    .datasets()
                    .value
                    .iter()
                    .find(|d| &d.id == id)
                    .map(|d| d.display_label())
                    .or_else(|| Some(id.clone()))
            })
            .unwrap_or_else(|| "Choose a dataset...".to_string());

        let mut chosen = current.clone();
        egui::ComboBox::from_id_salt("dataset_select")
            .width(420.0)
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for dataset in &state.loader.datasets().value {
                    ui.selectable_value(&mut chosen, Some(dataset.id.clone()), dataset.display_label());
                }
            });
        if chosen != current {
            if let Some(id) = &chosen {
                state.loader.select_dataset(id);
                state.search_results.clear();
                state.searched = false;
            }
        }

        if state.loader.dataset_id().is_some() {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("📊 Dashboard").clicked() {
                    state.view = View::Dashboard;
                }
                if ui.button("🔍 Gene Search").clicked() {
                    state.view = View::GeneSearch;
                }
                if ui.button("🗂 Dataset Info").clicked() {
                    state.view = View::DatasetInfo;
                }
            });
        }
    });
}

fn no_dataset(ui: &mut Ui) {
    ui.centered_and_justified(|ui| {
        ui.label("No dataset selected. Pick one on the Home screen first.");
    });
}

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        for tab in Tab::ALL {
            if ui.selectable_label(state.selected_tab == tab, tab.label()).clicked() {
                state.selected_tab = tab;
            }
        }
    });
}

pub fn dashboard_view(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset_id) = state.loader.dataset_id().map(str::to_string) else {
        no_dataset(ui);
        return;
    };

    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.heading("Analysis Dashboard");
            ui.label(format!("Dataset: {}", dataset_id));
        });
        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
            let running = state.loader.analysis_running();
            let label = if running { "Running Analysis..." } else { "Run Analysis" };
            if ui.add_enabled(!running, egui::Button::new(label)).clicked() {
                state.loader.run_analysis();
            }
            if ui
                .add_enabled(!state.loader.is_loading(), egui::Button::new("⟳ Reload"))
                .clicked()
            {
                state.loader.reload();
            }
            if running || state.loader.is_loading() {
                ui.spinner();
            }
        });
    });

    tab_bar(ui, state);
    ui.separator();

    if state.selected_tab == Tab::Upload {
        upload_tab(ui, state);
        return;
    }

    let Some(data) = state.loader.data() else {
        ui.centered_and_justified(|ui| {
            ui.spinner();
            ui.label("Loading analysis data...");
        });
        return;
    };

    egui::ScrollArea::vertical().show(ui, |ui| match state.selected_tab {
        Tab::Expression => expression_tab(ui, data),
        Tab::Classification => classification_tab(ui, &data.classifier),
        Tab::Visualization => visualization_tab(ui, data, state.loader.is_loading()),
        Tab::Advanced => advanced_tab(ui),
        Tab::Upload => {}
    });
}

fn expression_tab(ui: &mut Ui, data: &DashboardData) {
    let stats = GeneTableStats::from_genes(&data.genes.value);
    ui.horizontal_wrapped(|ui| {
        stat_tile(ui, "Genes in table", stats.total.to_string(), EXPRESSION);
        stat_tile(
            ui,
            "Significant (adj. p < 0.05)",
            stats.significant.to_string(),
            Color32::from_rgb(22, 163, 74),
        );
        stat_tile(ui, "Upregulated", stats.upregulated.to_string(), SIGNIFICANT);
        stat_tile(
            ui,
            "Downregulated",
            stats.downregulated.to_string(),
            Color32::from_rgb(147, 51, 234),
        );
    });
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.heading("Top Differentially Expressed Genes");
        demo_badge(ui, &data.genes);
    });
    ui.label("Genes ranked by statistical significance and fold change");
    gene_table(ui, &data.genes.value);
}

fn gene_table(ui: &mut Ui, genes: &[GeneExpression]) {
    if genes.is_empty() {
        ui.label("No genes returned for this dataset.");
        return;
    }

    TableBuilder::new(ui)
        .id_salt("gene_table")
        .striped(true)
        .cell_layout(Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Gene Symbol", "Log2 Fold Change", "P-value", "Adj. P-value", "Regulation"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(20.0, genes.len(), |mut row| {
                let gene = &genes[row.index()];
                row.col(|ui| {
                    let label = ui.colored_label(EXPRESSION, &gene.symbol);
                    if let Some(description) = &gene.description {
                        label.on_hover_text(format!("{}\n{}", gene.name, description));
                    }
                });
                row.col(|ui| {
                    ui.label(format!("{:.2}", gene.log_fc));
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", gene.p_value));
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", gene.adj_p_value));
                });
                row.col(|ui| match gene.regulation() {
                    Regulation::Up => {
                        ui.colored_label(SIGNIFICANT, "Up");
                    }
                    Regulation::Down => {
                        ui.colored_label(EXPRESSION, "Down");
                    }
                });
            });
        });
}

fn classification_tab(ui: &mut Ui, classifier: &Sourced<ClassifierResults>) {
    let results = &classifier.value;
    ui.horizontal(|ui| {
        ui.heading("Model Performance");
        demo_badge(ui, classifier);
    });
    ui.horizontal_wrapped(|ui| {
        stat_tile(ui, "Accuracy", percent(results.accuracy), EXPRESSION);
        stat_tile(ui, "F1-Score", percent(results.f1_score), Color32::from_rgb(22, 163, 74));
        stat_tile(ui, "Precision", percent(results.precision), Color32::from_rgb(147, 51, 234));
        stat_tile(ui, "Recall", percent(results.recall), Color32::from_rgb(234, 88, 12));
    });
    if let Some(explanation) = &results.explanation {
        ui.label(RichText::new(explanation).italics());
    }

    ui.add_space(8.0);
    ui.heading("Confusion Matrix");
    ui.label("Model prediction accuracy breakdown");
    let correct = Color32::from_rgb(220, 252, 231);
    let wrong = Color32::from_rgb(254, 226, 226);
    let cells = [
        [
            (results.true_negatives(), "True Negative", correct),
            (results.false_positives(), "False Positive", wrong),
        ],
        [
            (results.false_negatives(), "False Negative", wrong),
            (results.true_positives(), "True Positive", correct),
        ],
    ];
    egui::Grid::new("confusion_matrix")
        .spacing([6.0, 6.0])
        .show(ui, |ui| {
            for row in cells {
                for (count, label, fill) in row {
                    let (rect, _) = ui.allocate_exact_size(Vec2::new(140.0, 64.0), Sense::hover());
                    let painter = ui.painter();
                    painter.rect_filled(rect, 4.0, fill);
                    painter.text(
                        rect.center() - Vec2::new(0.0, 8.0),
                        Align2::CENTER_CENTER,
                        count.to_string(),
                        FontId::proportional(20.0),
                        Color32::BLACK,
                    );
                    painter.text(
                        rect.center() + Vec2::new(0.0, 16.0),
                        Align2::CENTER_CENTER,
                        label,
                        FontId::proportional(11.0),
                        Color32::DARK_GRAY,
                    );
                }
                ui.end_row();
            }
        });

    if let Some(roc) = &results.roc_data {
        ui.add_space(8.0);
        ui.heading(format!("ROC Curve (AUC {:.3})", roc.auc));
        let curve: PlotPoints = roc
            .fpr
            .iter()
            .zip(&roc.tpr)
            .map(|(&x, &y)| [x, y])
            .collect();
        Plot::new("roc_curve")
            .height(260.0)
            .data_aspect(1.0)
            .x_axis_label("False positive rate")
            .y_axis_label("True positive rate")
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(vec![[0.0, 0.0], [1.0, 1.0]])).color(NON_SIGNIFICANT));
                plot_ui.line(Line::new(curve).color(EXPRESSION).name("ROC"));
            });
    }
}

fn visualization_tab(ui: &mut Ui, data: &DashboardData, loading: bool) {
    if loading {
        for title in ["Volcano Plot", "PCA Analysis", "Expression Heatmap"] {
            ui.heading(title);
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_min_height(160.0);
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            });
        }
        return;
    }

    ui.heading("Volcano Plot");
    ui.label("Statistical significance vs fold change");
    match &data.volcano {
        Some(volcano) => volcano_plot(ui, volcano),
        None => placeholder(ui, "Volcano plot", "Connect the analytics backend to view"),
    }

    ui.add_space(8.0);
    ui.heading("PCA Analysis");
    ui.label("Sample distribution in principal component space");
    match &data.pca {
        Some(pca) => pca_plot(ui, pca),
        None => placeholder(ui, "PCA plot", "Connect the analytics backend to view"),
    }

    ui.add_space(8.0);
    ui.heading("Expression Heatmap");
    ui.label("Top differentially expressed genes across samples");
    match &data.heatmap {
        Some(heatmap) => heatmap_grid(ui, heatmap),
        None => placeholder(ui, "Heatmap", "Connect the analytics backend to view"),
    }
}

fn volcano_plot(ui: &mut Ui, volcano: &VolcanoPlotData) {
    let (significant, other): (Vec<_>, Vec<_>) = volcano.genes.iter().partition(|g| g.significant);
    let to_points = |genes: Vec<&VolcanoPoint>| -> PlotPoints {
        genes.iter().map(|g| [g.log_fc, g.neg_log_p_value]).collect()
    };
    let symbols: Vec<(f64, f64, String)> = volcano
        .genes
        .iter()
        .map(|g| (g.log_fc, g.neg_log_p_value, g.symbol.clone()))
        .collect();

    Plot::new("volcano_plot")
        .height(300.0)
        .legend(Legend::default())
        .x_axis_label("Log2 Fold Change")
        .y_axis_label("-Log10 P-value")
        .label_formatter(move |_, point| {
            nearest_label(&symbols, point.x, point.y)
                .map(|symbol| format!("{}\nlogFC {:.2}\n-log10 p {:.2}", symbol, point.x, point.y))
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(to_points(significant)).color(SIGNIFICANT).radius(3.5).name("Significant"));
            plot_ui.points(Points::new(to_points(other)).color(NON_SIGNIFICANT).radius(3.0).name("Non-significant"));
        });
}

fn nearest_label(points: &[(f64, f64, String)], x: f64, y: f64) -> Option<&str> {
    points
        .iter()
        .min_by(|a, b| {
            let da = (a.0 - x).powi(2) + (a.1 - y).powi(2);
            let db = (b.0 - x).powi(2) + (b.1 - y).powi(2);
            da.total_cmp(&db)
        })
        .map(|p| p.2.as_str())
}

fn pca_plot(ui: &mut Ui, pca: &PcaData) {
    let mut by_condition: Vec<(String, Vec<[f64; 2]>)> = Vec::new();
    for sample in &pca.samples {
        match by_condition.iter_mut().find(|(c, _)| c == &sample.condition) {
            Some((_, points)) => points.push([sample.pc1, sample.pc2]),
            None => by_condition.push((sample.condition.clone(), vec![[sample.pc1, sample.pc2]])),
        }
    }
    let samples: Vec<(f64, f64, String)> = pca
        .samples
        .iter()
        .map(|s| (s.pc1, s.pc2, s.sample.clone()))
        .collect();

    Plot::new("pca_plot")
        .height(300.0)
        .legend(Legend::default())
        .x_axis_label(format!("PC1 ({}%)", pca.variance.pc1))
        .y_axis_label(format!("PC2 ({}%)", pca.variance.pc2))
        .label_formatter(move |_, point| {
            nearest_label(&samples, point.x, point.y)
                .map(|sample| format!("{}\nPC1 {:.2}\nPC2 {:.2}", sample, point.x, point.y))
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for (condition, points) in by_condition {
                let color = if condition == "disease" { SIGNIFICANT } else { EXPRESSION };
                plot_ui.points(Points::new(PlotPoints::from(points)).color(color).radius(4.0).name(condition));
            }
        });

    if let Some(explanation) = &pca.explanation {
        ui.label(RichText::new(explanation).italics());
    }
}

fn heatmap_grid(ui: &mut Ui, heatmap: &HeatmapData) {
    let cell = Vec2::new(48.0, 22.0);
    egui::ScrollArea::horizontal().id_salt("heatmap_scroll").show(ui, |ui| {
        egui::Grid::new("heatmap").spacing([2.0, 2.0]).show(ui, |ui| {
            ui.label("");
            for sample in &heatmap.samples {
                ui.label(RichText::new(sample).small());
            }
            ui.end_row();

            for (gene, row) in heatmap.genes.iter().zip(&heatmap.expression) {
                ui.label(RichText::new(gene).strong());
                for (sample, &value) in heatmap.samples.iter().zip(row) {
                    let intensity = heatmap_intensity(value);
                    let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                    let fill = Color32::from_rgba_unmultiplied(59, 130, 246, (intensity * 255.0) as u8);
                    let text = if intensity > 0.5 { Color32::WHITE } else { Color32::BLACK };
                    ui.painter().rect_filled(rect, 2.0, fill);
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        format!("{:.1}", value),
                        FontId::proportional(11.0),
                        text,
                    );
                    response.on_hover_text(format!("{} in {}: {:.2}", gene, sample, value));
                }
                ui.end_row();
            }
        });
    });

    for (name, values) in &heatmap.annotations {
        ui.label(format!("{}: {}", name, values.join(", ")));
    }
}

fn advanced_tab(ui: &mut Ui) {
    ui.heading("Advanced Analysis");
    ui.label("Additional statistical and pathway analysis");
    ui.columns(2, |columns| {
        placeholder(&mut columns[0], "Pathway Enrichment", "Connect the analytics backend to view");
        placeholder(&mut columns[1], "Gene Ontology", "Connect the analytics backend to view");
    });
}

fn pick_upload(state: &mut AppState) {
    let Some(path) = FileDialog::new()
        .add_filter("Expression data", &["csv", "xlsx"])
        .pick_file()
    else {
        return;
    };

    state.upload_preview = None;
    state.loader.reset_upload();
    match UploadFile::inspect(&path) {
        Ok(file) => {
            if file.kind == UploadKind::Csv {
                let rows = state.loader.config().infer_schema_length;
                state.upload_preview = Some(preview_csv(&file.path, rows).map_err(|e| e.to_string()));
            }
            state.upload_error = None;
            state.pending_upload = Some(file);
        }
        Err(rejection) => {
            state.pending_upload = None;
            state.upload_error = Some(rejection.to_string());
        }
    }
}

fn upload_tab(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Upload Custom Dataset");
    ui.label(format!(
        "Upload your own gene expression data (CSV or Excel, max {} MB)",
        MAX_UPLOAD_BYTES / 1024 / 1024
    ));
    ui.add_space(8.0);

    if ui.button("📂 Choose file...").clicked() {
        pick_upload(state);
    }
    if let Some(error) = &state.upload_error {
        ui.colored_label(Color32::RED, error);
    }

    let mut cancel = false;
    if let Some(file) = &state.pending_upload {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.strong(&file.name);
                ui.label(format!("{:.2} MB", file.size_mb()));
                ui.label(RichText::new(file.kind.label()).small());
            });

            match &state.upload_preview {
                Some(Ok(preview)) => {
                    ui.label(format!(
                        "{} genes × {} samples",
                        preview.genes,
                        preview.samples.len()
                    ));
                    if preview.is_valid() {
                        ui.colored_label(Color32::from_rgb(22, 163, 74), "✔ Looks like an expression matrix");
                    } else if !preview.non_numeric_samples.is_empty() {
                        ui.colored_label(
                            Color32::from_rgb(234, 88, 12),
                            format!(
                                "Non-numeric sample columns: {}",
                                preview.non_numeric_samples.join(", ")
                            ),
                        );
                    } else {
                        ui.colored_label(
                            Color32::from_rgb(234, 88, 12),
                            "Expected a gene column followed by at least one sample column",
                        );
                    }
                }
                Some(Err(e)) => {
                    ui.colored_label(Color32::from_rgb(234, 88, 12), format!("Could not preview: {}", e));
                }
                None => {}
            }

            match state.loader.upload_state().clone() {
                UploadState::Idle => {
                    ui.horizontal(|ui| {
                        if ui.button("Upload & Process").clicked() {
                            state.loader.upload(file.clone());
                        }
                        if ui.button("Cancel").clicked() {
                            cancel = true;
                        }
                    });
                }
                UploadState::Uploading(_) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Uploading and processing your dataset...");
                    });
                }
                UploadState::Done(response) => {
                    ui.colored_label(Color32::from_rgb(22, 163, 74), response.message);
                    if ui.button("Done").clicked() {
                        cancel = true;
                    }
                }
                UploadState::Failed(message) => {
                    ui.colored_label(Color32::RED, message);
                    if ui.button("Remove").clicked() {
                        cancel = true;
                    }
                }
            }
        });
    }
    if cancel {
        state.pending_upload = None;
        state.upload_preview = None;
        state.loader.reset_upload();
    }

    ui.add_space(8.0);
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.strong("Expected Format:");
        ui.label("• First column: Gene symbols/IDs");
        ui.label("• Subsequent columns: Sample expression values");
        ui.label("• Header row with sample names");
        ui.label("• Numeric expression values only");
    });
}

fn search_result_label(gene: &GeneExpression) -> String {
    format!("{}: {}", gene.symbol, gene.name)
}

pub fn gene_search_view(ui: &mut Ui, state: &mut AppState) {
    if state.loader.dataset_id().is_none() {
        no_dataset(ui);
        return;
    }

    ui.heading("Gene Search");
    ui.label("Enter a gene symbol or name to search for expression data");
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.search_term)
                .hint_text("e.g., BRCA1, TP53, ESR1...")
                .desired_width(280.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Search").clicked() || submitted {
            state.search_genes();
        }
    });

    ui.horizontal_wrapped(|ui| {
        ui.label("Quick access:");
        for symbol in QUICK_ACCESS_GENES {
            if ui.small_button(symbol).clicked() {
                state.search_term = symbol.to_string();
                state.search_genes();
                state.loader.lookup_gene(symbol);
            }
        }
    });
    ui.separator();

    if state.searched {
        if state.search_results.is_empty() {
            ui.label("No matching genes in the current table.");
        } else {
            ui.label(format!("Found {} matching genes", state.search_results.len()));
            let mut picked = None;
            for gene in &state.search_results {
                ui.horizontal(|ui| {
                    if ui.link(search_result_label(gene)).clicked() {
                        picked = Some(gene.symbol.clone());
                    }
                    ui.label(RichText::new(format!("p = {:.3}", gene.p_value)).small());
                });
            }
            if let Some(symbol) = picked {
                state.loader.lookup_gene(&symbol);
            }
        }
    }

    ui.add_space(8.0);
    if state.loader.is_looking_up_gene() {
        ui.spinner();
    } else if let Some(gene) = state.loader.gene() {
        gene_details(ui, gene);
        if ui.button("Clear").clicked() {
            state.loader.clear_gene();
        }
    }
}

fn gene_details(ui: &mut Ui, gene: &Sourced<GeneExpression>) {
    let g = &gene.value;
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.heading(format!("{} Expression", g.symbol));
            demo_badge(ui, gene);
        });
        ui.label(&g.name);
        if let Some(description) = &g.description {
            ui.label(RichText::new(description).italics());
        }
        ui.horizontal(|ui| {
            let mean = g
                .mean_expression()
                .map(|m| format!("{:.2}", m))
                .unwrap_or_else(|| "n/a".to_string());
            stat_tile(ui, "Mean Expression", mean, EXPRESSION);
            stat_tile(ui, "P-value", format!("{:.3}", g.p_value), Color32::from_rgb(22, 163, 74));
        });

        let bars: Vec<Bar> = g
            .sample_values()
            .iter()
            .enumerate()
            .map(|(i, &v)| Bar::new(i as f64, v).name(format!("Sample {}", i + 1)))
            .collect();
        if bars.is_empty() {
            ui.label("No per-sample values.");
            return;
        }
        Plot::new("gene_expression_bars")
            .height(200.0)
            .x_axis_formatter(|x, _| format!("S{}", x.value.round() as i64 + 1))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(EXPRESSION));
            });
    });
}

pub fn dataset_info_view(ui: &mut Ui, state: &mut AppState) {
    if state.loader.dataset_id().is_none() {
        no_dataset(ui);
        return;
    }
    let Some(details) = state.loader.details() else {
        ui.spinner();
        return;
    };
    let info = &details.value;
    let dataset = &info.dataset;

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.heading(&dataset.title);
            demo_badge(ui, details);
        });
        ui.label(RichText::new(&dataset.id).monospace());
        if let Some(description) = &dataset.description {
            ui.label(description);
        }
        ui.add_space(8.0);

        egui::Grid::new("dataset_info").num_columns(2).striped(true).show(ui, |ui| {
            let rows = [
                ("Samples", dataset.samples.to_string()),
                ("Organism", dataset.organism.clone()),
                ("Platform", info.platform.clone()),
                ("Submitted", dataset.submission_date.clone().unwrap_or_default()),
                ("Last update", dataset.last_update.clone().unwrap_or_default()),
                ("Publication", info.publication.clone()),
            ];
            for (label, value) in rows {
                ui.strong(label);
                ui.label(value);
                ui.end_row();
            }
        });

        ui.add_space(8.0);
        ui.heading("Sample Distribution");
        for disease in &dataset.diseases {
            ui.horizontal(|ui| {
                ui.label(disease);
                ui.label(RichText::new(format!("{} samples", info.samples_per_condition())).small());
            });
        }

        ui.add_space(8.0);
        ui.heading("Contributors");
        for contributor in &info.contributors {
            ui.label(contributor);
        }
    });
}

pub fn toasts(ctx: &egui::Context, state: &mut AppState) {
    let now = Instant::now();
    for notice in state.loader.drain_notices() {
        state.toasts.push((notice, now));
    }
    state.toasts.retain(|(_, shown)| now.duration_since(*shown) < TOAST_TTL);
    if state.toasts.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("toasts"))
        .anchor(Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .show(ctx, |ui| {
            ui.with_layout(Layout::bottom_up(egui::Align::Max), |ui| {
                for (notice, _) in &state.toasts {
                    let accent = match notice.kind {
                        NoticeKind::Info => EXPRESSION,
                        NoticeKind::Success => Color32::from_rgb(22, 163, 74),
                        NoticeKind::Warning => Color32::from_rgb(234, 88, 12),
                        NoticeKind::Error => Color32::RED,
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.colored_label(accent, RichText::new(&notice.title).strong());
                        ui.label(&notice.body);
                    });
                }
            });
        });
    ctx.request_repaint_after(Duration::from_millis(250));
}

pub fn debug_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::bottom("debug_panel")
        .resizable(true)
        .min_height(50.0)
        .default_height(state.debug_panel_height)
        .show_animated(ctx, state.debug_panel_visible, |ui| {
            state.debug_panel_height = ui.available_height();

            ui.horizontal(|ui| {
                ui.heading("Request Log");
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear").clicked() {
                        state.debug_log.clear();
                        state.debug_output.clear();
                    }
                    if ui.button("Hide").clicked() {
                        state.debug_panel_visible = false;
                    }
                });
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.with_layout(Layout::top_down_justified(egui::Align::Min), |ui| {
                        ui.add(
                            egui::TextEdit::multiline(&mut state.debug_output.as_str())
                                .desired_width(f32::INFINITY)
                                .desired_rows(10)
                                .font(egui::TextStyle::Monospace)
                                .code_editor(),
                        );
                    });
                });
        });
}

pub fn show_debug_toggle(ui: &mut Ui, state: &mut AppState) {
    if !state.debug_panel_visible {
        ui.with_layout(Layout::bottom_up(egui::Align::Center), |ui| {
            if ui.button("Show Request Log").clicked() {
                state.debug_panel_visible = true;
            }
        });
    }
}

pub fn central_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default().show(ctx, |ui| {
        nav_bar(ui, state);
        ui.separator();

        ui.with_layout(Layout::top_down(egui::Align::Min), |ui| match state.view {
            View::Home => home_view(ui, state),
            View::Dashboard => dashboard_view(ui, state),
            View::GeneSearch => gene_search_view(ui, state),
            View::DatasetInfo => dataset_info_view(ui, state),
        });

        show_debug_toggle(ui, state);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_label_picks_closest_point() {
        let points = vec![
            (2.45, 3.0, "BRCA1".to_string()),
            (-1.89, 2.5, "TP53".to_string()),
        ];
        assert_eq!(nearest_label(&points, 2.0, 2.9), Some("BRCA1"));
        assert_eq!(nearest_label(&points, -2.0, 2.0), Some("TP53"));
        assert_eq!(nearest_label(&[], 0.0, 0.0), None);
    }

    #[test]
    fn search_results_read_symbol_then_name() {
        let gene = crate::mock::top_genes().remove(0);
        assert_eq!(search_result_label(&gene), format!("BRCA1: {}", gene.name));
        assert!(search_result_label(&gene).is_ascii());
    }
}
