use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, KeyboardEvent, Url};

use neurobot_chat::{dispatch, ChatApp, ConversationId, Role};
use neurobot_types::{ClientConfig, EXPORT_FAILURE_ALERT};

use crate::dom;
use crate::http::HttpTransport;
use crate::markdown;
use crate::storage::LocalStorage;
use crate::theme::Theme;
use crate::utils;

const PREVIEW_CHARS: usize = 60;

/// Root of the chat client: wires the page's controls to the chat state
pub struct NeurobotApp {
    view: View,
}

/// Shared handles captured by every event handler
#[derive(Clone)]
struct View {
    document: Document,
    config: Rc<ClientConfig>,
    app: Rc<RefCell<ChatApp<LocalStorage>>>,
    transport: Rc<HttpTransport>,
    prefs: LocalStorage,
    theme: Rc<Cell<Theme>>,
}

impl NeurobotApp {
    pub fn new(config: ClientConfig) -> Result<Self, JsValue> {
        let document = crate::document()?;
        let storage = LocalStorage::open();
        let theme = Theme::load(&storage, &config.theme_storage_key);
        let app = ChatApp::open(storage.clone(), &config.storage_key);
        log::info!(
            "Loaded {} conversations (persistent: {})",
            app.history().len(),
            storage.is_available()
        );

        Ok(Self {
            view: View {
                document,
                transport: Rc::new(HttpTransport::new(&config)),
                config: Rc::new(config),
                app: Rc::new(RefCell::new(app)),
                prefs: storage,
                theme: Rc::new(Cell::new(theme)),
            },
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.setup_message_input()?;
        self.setup_controls()?;
        self.setup_file_upload()?;
        self.setup_history_list()?;

        self.view.apply_theme()?;
        self.view.render()
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        let send_btn = dom::get_element_by_id(&self.view.document, "sendButton")?;
        let view = self.view.clone();
        dom::add_click_listener(&send_btn, move || view.report(view.submit_input()))?;

        let input = dom::get_element_by_id(&self.view.document, "messageInput")?;
        let view = self.view.clone();
        dom::add_event_listener(&input, "keydown", move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                event.prevent_default();
                view.report(view.submit_input());
            }
        })
    }

    fn setup_controls(&self) -> Result<(), JsValue> {
        let document = &self.view.document;

        let view = self.view.clone();
        dom::add_click_listener(&dom::get_element_by_id(document, "newConversationButton")?, move || {
            view.app.borrow_mut().new_conversation();
            view.report(view.render());
        })?;

        let view = self.view.clone();
        dom::add_click_listener(&dom::get_element_by_id(document, "themeToggle")?, move || {
            let theme = view.theme.get().toggled();
            view.theme.set(theme);
            theme.save(&view.prefs, &view.config.theme_storage_key);
            view.report(view.apply_theme());
        })?;

        let view = self.view.clone();
        dom::add_click_listener(&dom::get_element_by_id(document, "exportButton")?, move || {
            let view = view.clone();
            wasm_bindgen_futures::spawn_local(async move {
                view.export_pdf().await;
            });
        })
    }

    fn setup_file_upload(&self) -> Result<(), JsValue> {
        let document = self.view.document.clone();
        dom::add_click_listener(&dom::get_element_by_id(&document, "importButton")?, move || {
            match dom::get_html_element_by_id(&document, "fileUpload") {
                Ok(picker) => picker.click(),
                Err(e) => log::error!("File picker missing: {:?}", e),
            }
        })?;

        let picker = dom::get_element_by_id(&self.view.document, "fileUpload")?;
        let view = self.view.clone();
        dom::add_event_listener(&picker, "change", move |_event: web_sys::Event| {
            view.report(view.upload_selected_file());
        })
    }

    /// One delegated listener handles every load/delete button in the sidebar
    fn setup_history_list(&self) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.view.document, "historyList")?;
        let view = self.view.clone();
        dom::add_event_listener(&list, "click", move |event: web_sys::Event| {
            let Some(button) = dom::closest_with_attribute(&event, "data-action") else {
                return;
            };
            let id = button
                .get_attribute("data-id")
                .and_then(|raw| raw.parse::<u64>().ok())
                .map(ConversationId);
            let Some(id) = id else {
                log::warn!("History button without a conversation id");
                return;
            };

            let result = match button.get_attribute("data-action").as_deref() {
                Some("load") => view.app.borrow_mut().load_conversation(id),
                Some("delete") => view.app.borrow_mut().delete_conversation(id).map(|_| ()),
                other => {
                    log::warn!("Unknown history action: {:?}", other);
                    return;
                }
            };
            if let Err(e) = result {
                log::error!("History action failed: {}", e);
            }
            view.report(view.render());
        })
    }
}

impl View {
    fn report(&self, result: Result<(), JsValue>) {
        if let Err(e) = result {
            log::error!("UI update failed: {:?}", e);
        }
    }

    fn submit_input(&self) -> Result<(), JsValue> {
        let input = dom::get_input_by_id(&self.document, "messageInput")?;
        let Some(text) = self.app.borrow_mut().begin_send(&input.value()) else {
            return Ok(());
        };
        input.set_value("");
        self.render()?;

        let view = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            dispatch::complete_send(&*view.app, view.transport.as_ref(), &text).await;
            view.report(view.render());
        });
        Ok(())
    }

    fn upload_selected_file(&self) -> Result<(), JsValue> {
        let picker = dom::get_input_by_id(&self.document, "fileUpload")?;
        let Some(file) = picker.files().and_then(|files| files.get(0)) else {
            return Ok(());
        };
        // allow picking the same file again
        picker.set_value("");

        let view = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            dispatch::upload_file(&*view.app, view.transport.as_ref(), file).await;
            view.report(view.render());
        });
        Ok(())
    }

    async fn export_pdf(&self) {
        match dispatch::export_conversation(&*self.app, self.transport.as_ref()).await {
            Ok(bytes) => {
                if let Err(e) = self.download_pdf(&bytes) {
                    log::error!("PDF download failed: {:?}", e);
                }
            }
            Err(e) => {
                log::error!("PDF export failed: {}", e);
                if let Ok(window) = crate::window() {
                    let _ = window.alert_with_message(EXPORT_FAILURE_ALERT);
                }
            }
        }
    }

    fn download_pdf(&self, bytes: &[u8]) -> Result<(), JsValue> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type("application/pdf");
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        let url = Url::create_object_url_with_blob(&blob)?;
        let anchor = self
            .document
            .create_element("a")?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| JsValue::from_str("Failed to create download link"))?;
        anchor.set_href(&url);
        anchor.set_download(&self.config.export_filename);
        anchor.click();
        Url::revoke_object_url(&url)
    }

    fn apply_theme(&self) -> Result<(), JsValue> {
        let theme = self.theme.get();
        let root = dom::get_element_by_id(&self.document, "app")?;
        root.set_class_name(&theme.root_class());
        let toggle = dom::get_element_by_id(&self.document, "themeToggle")?;
        dom::set_text_content(&toggle, theme.toggle_label());
        Ok(())
    }

    fn render(&self) -> Result<(), JsValue> {
        self.render_messages()?;
        self.render_history()
    }

    fn render_messages(&self) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, "messagesContainer")?;
        dom::clear_element(&container);

        let app = self.app.borrow();
        for message in app.messages() {
            let role = message.role();
            let msg_div = dom::create_element_with_class(
                &self.document,
                "div",
                &format!("message {}", role.as_str()),
            )?;
            let use_markdown = self.config.markdown && role == Role::Assistant;
            let content_html = markdown::render_message_content(message.content(), use_markdown);
            let markdown_class = if use_markdown { " markdown" } else { "" };
            msg_div.set_inner_html(&format!(
                r#"<strong class="message-role">{} :</strong><div class="message-content{}">{}</div>"#,
                role.speaker_label(),
                markdown_class,
                content_html
            ));
            container.append_child(&msg_div)?;
        }

        dom::scroll_to_bottom(&container);
        Ok(())
    }

    fn render_history(&self) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, "historyList")?;
        dom::clear_element(&list);

        let app = self.app.borrow();
        let active = app.active_index();
        for (index, entry) in app.history().iter().enumerate() {
            let class = if active == Some(index) {
                "conversation-preview active"
            } else {
                "conversation-preview"
            };
            let row = dom::create_element_with_class(&self.document, "div", class)?;

            let title = entry
                .messages
                .preview(PREVIEW_CHARS)
                .map(|p| format!(r#" title="{}""#, utils::escape_html(&p)))
                .unwrap_or_default();
            row.set_inner_html(&format!(
                r#"<button data-action="load" data-id="{id}"{title}>Conversation {n}</button><button data-action="delete" data-id="{id}" aria-label="Supprimer">🗑️</button>"#,
                id = entry.id.0,
                title = title,
                n = index + 1
            ));
            list.append_child(&row)?;
        }
        Ok(())
    }
}
