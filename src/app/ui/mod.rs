use eframe::egui::{self, Align2, Context, Key, ScrollArea, Slider, TextEdit, vec2};

use super::WorkflowApp;
use crate::workflow::{Intent, SettingsPatch};

impl WorkflowApp {
    pub(in crate::app) fn show_windows(&mut self, ctx: &Context, now: f64) {
        self.show_topic_prompt(ctx, now);
        self.show_result_view(ctx);
        self.show_settings_editor(ctx, now);
    }

    fn show_topic_prompt(&mut self, ctx: &Context, now: f64) {
        let Some(prompt) = self.topic_prompt.as_mut() else {
            return;
        };

        let mut submitted = None;
        let mut close = false;

        egui::Window::new("Enter Poem Topic")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let edit = ui.add(
                    TextEdit::singleline(&mut prompt.draft)
                        .hint_text("Enter a topic for the poem...")
                        .desired_width(280.0),
                );
                edit.request_focus();

                if edit.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                    submitted = Some((prompt.coordinator, prompt.draft.clone()));
                    close = true;
                }

                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.label("Press Enter to submit");
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.topic_prompt = None;
        }
        if let Some((coordinator, topic)) = submitted {
            self.apply_intent(Intent::TopicSubmitted { coordinator, topic }, now);
        }
    }

    fn show_result_view(&mut self, ctx: &Context) {
        let Some(view) = self.result_view.as_ref() else {
            return;
        };

        let mut open = true;
        egui::Window::new("Final Poem")
            .collapsible(false)
            .default_size(vec2(420.0, 380.0))
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    ui.label(view.text.as_str());
                });
            });

        if !open {
            self.result_view = None;
        }
    }

    fn show_settings_editor(&mut self, ctx: &Context, now: f64) {
        let Some(editor) = self.settings_editor.as_mut() else {
            return;
        };

        let mut saved = None;
        let mut close = false;
        let title = self
            .graph
            .node(editor.node)
            .map(|node| format!("Settings: {}", node.label))
            .unwrap_or_else(|| "Settings".to_owned());

        egui::Window::new(title)
            .id(egui::Id::new("node-settings"))
            .collapsible(false)
            .default_size(vec2(360.0, 260.0))
            .show(ctx, |ui| {
                ui.label("System prompt");
                ui.add(
                    TextEdit::multiline(&mut editor.system_prompt)
                        .desired_rows(5)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(4.0);
                ui.add(
                    Slider::new(&mut editor.temperature, 0.0..=1.0)
                        .text("temperature")
                        .fixed_decimals(2),
                );

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        saved = Some((
                            editor.node,
                            SettingsPatch {
                                system_prompt: editor.system_prompt.clone(),
                                temperature: editor.temperature,
                            },
                        ));
                        close = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if close {
            self.settings_editor = None;
        }
        if let Some((id, patch)) = saved {
            self.apply_intent(Intent::SettingsSaved { id, patch }, now);
        }
    }
}
