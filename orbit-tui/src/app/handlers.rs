use crate::app::state::{Action, App, AuthMode, AuthField, Dialog, InputMode, Screen};
use crate::log_to;
use crate::text_wrapper::{wrap_textarea_if_needed, WrapConfig};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Translate a key press into local state changes, returning the async work
/// it asks for, if any.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<Option<Action>> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    log_to!(app.log_config, Keys, "{:?} on {:?}", key, app.screen);

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return Ok(None);
    }

    // Priority 1: Help modal
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return Ok(None);
    }

    // Priority 2: Blocking dialogs
    if let Some(dialog) = app.dialog.clone() {
        return Ok(handle_dialog_keys(app, dialog, key));
    }

    // Priority 3: Login screen owns the keyboard
    if app.screen == Screen::Login {
        return Ok(handle_login_keys(app, key));
    }

    // Priority 4: Detail modal over any screen
    if app.detail.is_some() {
        return Ok(handle_detail_keys(app, key));
    }

    match app.screen {
        Screen::Feed | Screen::Creator => Ok(handle_feed_keys(app, key)),
        Screen::Upload => Ok(handle_upload_keys(app, key)),
        Screen::Profile => Ok(handle_profile_keys(app, key)),
        Screen::Login => Ok(None),
    }
}

fn handle_dialog_keys(app: &mut App, dialog: Dialog, key: KeyEvent) -> Option<Action> {
    match dialog {
        Dialog::ConfirmDelete { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                return Some(Action::ConfirmDelete);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.dialog = None,
            _ => {}
        },
        Dialog::Error { .. } => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                app.dialog = None;
            }
        }
    }
    None
}

fn handle_login_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let auth = &mut app.auth_state;
    if auth.loading {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('r') {
            auth.toggle_mode();
        }
        return None;
    }

    match key.code {
        KeyCode::Esc => app.running = false,
        KeyCode::Tab | KeyCode::Down => auth.next_field(),
        KeyCode::Enter => {
            return Some(match auth.mode {
                AuthMode::Login => Action::Login,
                AuthMode::Register => Action::Register,
            });
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if auth.field == AuthField::Role => {
            auth.role = auth.role.toggled();
        }
        KeyCode::Char(c) => {
            if let Some(input) = auth.focused_input() {
                input.push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(input) = auth.focused_input() {
                input.pop();
            }
        }
        _ => {}
    }
    None
}

fn handle_feed_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.searching {
        match key.code {
            KeyCode::Esc => {
                app.feed.query.clear();
                app.searching = false;
                app.input_mode = InputMode::Navigation;
            }
            KeyCode::Enter => {
                app.searching = false;
                app.input_mode = InputMode::Navigation;
            }
            KeyCode::Char(c) => app.feed.query.push(c),
            KeyCode::Backspace => {
                app.feed.query.pop();
            }
            _ => {}
        }
        app.feed.clamp_selection();
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Esc => {
            if app.feed.query.is_empty() {
                app.running = false;
            } else {
                app.feed.query.clear();
                app.feed.clamp_selection();
            }
        }
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => app.feed.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.feed.select_previous(),
        KeyCode::Char('/') => {
            app.searching = true;
            app.input_mode = InputMode::Typing;
        }
        KeyCode::Enter | KeyCode::Char(' ') => return Some(Action::OpenDetail),
        KeyCode::Char('l') => return Some(Action::LikeSelected),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('c') => return Some(Action::AiCaptionSelected),
        KeyCode::Char('o') => return Some(Action::OpenMediaUrl),
        KeyCode::Char('r') => return Some(Action::LoadFeed),
        KeyCode::Char('S') => return Some(Action::SearchRemote),
        KeyCode::Char('a') if app.screen == Screen::Feed => {
            let next = if app.feed.author_filter.is_some() {
                None
            } else {
                app.feed.selected_post().map(|p| p.username.clone())
            };
            app.feed.author_filter = next;
            app.feed.clamp_selection();
        }
        KeyCode::Char('h') => {
            if app.screen == Screen::Feed {
                app.feed.reset_filters();
            } else {
                app.feed.query.clear();
                app.feed.clamp_selection();
            }
        }
        KeyCode::Char('p') => {
            if let Some(post) = app.feed.selected_post() {
                return Some(Action::OpenProfile(post.username.clone()));
            }
        }
        KeyCode::Char('P') => {
            if let Some(username) = app.current_username() {
                return Some(Action::OpenProfile(username));
            }
        }
        KeyCode::Char('u') => {
            app.navigate(Screen::Upload);
            if app.screen != Screen::Upload {
                app.set_status(
                    "Uploading is available to creators",
                    crate::app::StatusKind::Info,
                );
            }
        }
        KeyCode::Char('t') => return Some(Action::CycleColorScheme),
        KeyCode::Char('L') => return Some(Action::Logout),
        _ => {}
    }
    None
}

fn handle_detail_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let detail = app.detail.as_mut()?;

    if detail.composer.active {
        match key.code {
            KeyCode::Esc => {
                detail.composer.active = false;
                detail.reply_to = None;
                app.input_mode = InputMode::Navigation;
            }
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::ALT) => {
                return Some(Action::SubmitComment);
            }
            _ => {
                detail.composer.textarea.input(key);
                wrap_textarea_if_needed(&mut detail.composer.textarea, WrapConfig::COMMENT);
            }
        }
        return None;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_detail(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => detail.select_next(),
        KeyCode::Char('k') | KeyCode::Up => detail.select_previous(),
        KeyCode::Char('l') => return Some(Action::DetailLike),
        KeyCode::Char('o') => return Some(Action::OpenMediaUrl),
        KeyCode::Char('c') => {
            detail.reply_to = None;
            detail.composer.active = true;
            app.input_mode = InputMode::Typing;
        }
        KeyCode::Char('r') => {
            if let Some(comment) = detail.selected_comment() {
                detail.reply_to = Some(comment.id.clone());
                detail.composer.active = true;
                app.input_mode = InputMode::Typing;
            }
        }
        KeyCode::Char('p') => return Some(Action::OpenProfile(detail.post.username.clone())),
        _ => {}
    }
    None
}

fn handle_upload_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let uploading = app.upload.is_uploading();

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('u') if !uploading => Some(Action::StartUpload),
            KeyCode::Char('x') => Some(Action::CancelUpload),
            KeyCode::Char('g') if !uploading => Some(Action::SuggestCaption),
            KeyCode::Char('t') if !uploading => {
                app.upload.crop_to_square = !app.upload.crop_to_square;
                None
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => {
            if uploading {
                return Some(Action::CancelUpload);
            }
            app.navigate(Screen::home_for(app.current_role()));
        }
        KeyCode::Tab => app.upload.focus = app.upload.focus.next(),
        KeyCode::Enter if !uploading => {
            return Some(match app.upload.focus {
                crate::upload::UploadField::Path => Action::SelectUploadFile,
                _ => Action::StartUpload,
            });
        }
        KeyCode::Char(c) if !uploading => app.upload.focused_input().push(c),
        KeyCode::Backspace if !uploading => {
            app.upload.focused_input().pop();
        }
        _ => {}
    }
    None
}

fn handle_profile_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let own = app
        .profile
        .as_ref()
        .is_some_and(|p| p.is_own(app.session.username().as_deref()));
    let profile = app.profile.as_mut()?;

    if profile.editing_path {
        match key.code {
            KeyCode::Esc => {
                profile.editing_path = false;
                app.input_mode = InputMode::Navigation;
            }
            KeyCode::Enter => return Some(Action::SelectProfileFile),
            KeyCode::Char(c) => profile.path_input.push(c),
            KeyCode::Backspace => {
                profile.path_input.pop();
            }
            _ => {}
        }
        return None;
    }

    let uploading = profile.is_uploading();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_profile(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => profile.select_next(),
        KeyCode::Char('k') | KeyCode::Up => profile.select_previous(),
        KeyCode::Char('r') => return Some(Action::OpenProfile(profile.username.clone())),
        KeyCode::Char('f') if own && !uploading => {
            profile.editing_path = true;
            app.input_mode = InputMode::Typing;
        }
        KeyCode::Char('x') if own && !uploading => profile.crop_to_square = !profile.crop_to_square,
        KeyCode::Char('u') | KeyCode::Enter if own && !uploading && profile.file.is_some() => {
            return Some(Action::UploadProfilePicture);
        }
        KeyCode::Backspace if own && !uploading => profile.clear_selection(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, MediaApi, UploadHandle, UploadRequest};
    use crate::session::SessionContext;
    use async_trait::async_trait;
    use orbit_types::*;
    use std::sync::Arc;

    // Key handling never reaches the network
    struct OfflineApi;

    #[async_trait]
    impl MediaApi for OfflineApi {
        async fn login(&self, _: &str, _: &str) -> ApiResult<LoginResponse> {
            unimplemented!()
        }
        async fn register(&self, _: &str, _: &str, _: Role) -> ApiResult<serde_json::Value> {
            unimplemented!()
        }
        async fn verify_token(&self) -> ApiResult<VerifyTokenResponse> {
            unimplemented!()
        }
        async fn list_media(&self) -> ApiResult<Vec<Post>> {
            unimplemented!()
        }
        async fn search_media(&self, _: &str) -> ApiResult<Vec<Post>> {
            unimplemented!()
        }
        async fn upload_media(&self, _: UploadRequest) -> ApiResult<String> {
            unimplemented!()
        }
        fn upload_media_with_progress(&self, _: UploadRequest) -> UploadHandle {
            unimplemented!()
        }
        async fn like_media(&self, _: &str) -> ApiResult<LikeResponse> {
            unimplemented!()
        }
        async fn delete_media(&self, _: &str) -> ApiResult<Option<serde_json::Value>> {
            unimplemented!()
        }
        async fn ai_caption(&self, _: &str) -> ApiResult<CaptionResponse> {
            unimplemented!()
        }
        async fn get_comments(&self, _: &str) -> ApiResult<Vec<Comment>> {
            unimplemented!()
        }
        async fn add_comment(
            &self,
            _: &str,
            _: &str,
            _: Option<CommentId>,
        ) -> ApiResult<serde_json::Value> {
            unimplemented!()
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn post(name: &str, username: &str) -> Post {
        Post {
            name: name.to_string(),
            username: username.to_string(),
            caption: format!("caption of {}", name),
            title: None,
            url: String::new(),
            likes: 0,
            location: None,
            tagged_people: Vec::new(),
            uploaded_at: None,
        }
    }

    fn feed_app() -> App {
        let session = SessionContext::in_memory();
        session.store_login("tok", Role::Consumer, "luna").unwrap();
        let mut app = App::new(Arc::new(OfflineApi), session);
        app.navigate(Screen::Feed);
        app.feed
            .finish_load(vec![post("a.jpg", "luna"), post("b.jpg", "sol")]);
        app
    }

    #[test]
    fn test_login_typing_and_submit() {
        let mut app = App::new(Arc::new(OfflineApi), SessionContext::in_memory());
        for c in "luna".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, press(KeyCode::Char('x'))).unwrap();

        assert_eq!(app.auth_state.username, "luna");
        assert_eq!(app.auth_state.password, "x");
        let action = handle_key_event(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(action, Some(Action::Login));
    }

    #[test]
    fn test_register_toggle_and_role_picker() {
        let mut app = App::new(Arc::new(OfflineApi), SessionContext::in_memory());
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL),
        )
        .unwrap();
        assert_eq!(app.auth_state.mode, AuthMode::Register);

        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, press(KeyCode::Right)).unwrap();
        assert_eq!(app.auth_state.role, Role::Creator);
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)).unwrap(),
            Some(Action::Register)
        );
    }

    #[test]
    fn test_feed_navigation_and_actions() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.feed.selected_post().unwrap().name, "b.jpg");

        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('l'))).unwrap(),
            Some(Action::LikeSelected)
        );
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('p'))).unwrap(),
            Some(Action::OpenProfile("sol".to_string()))
        );
    }

    #[test]
    fn test_delete_asks_for_confirmation() {
        let mut app = feed_app();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('d'))).unwrap(), None);
        assert!(matches!(app.dialog, Some(Dialog::ConfirmDelete { ref name, .. }) if name == "a.jpg"));

        // Feed keys are swallowed while the dialog is up
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('l'))).unwrap(), None);

        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('y'))).unwrap(),
            Some(Action::ConfirmDelete)
        );
    }

    #[test]
    fn test_delete_dialog_cancel() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('d'))).unwrap();
        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(app.dialog.is_none());
        assert_eq!(app.feed.visible_posts().len(), 2);
    }

    #[test]
    fn test_search_mode_filters_locally() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('/'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Typing);
        for c in "sol".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        // 'l' is typed, not a like
        assert_eq!(app.feed.query, "sol");
        assert_eq!(app.feed.visible_posts().len(), 1);

        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(app.feed.query.is_empty());
        assert!(!app.searching);
    }

    #[test]
    fn test_author_filter_toggle() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.feed.author_filter.as_deref(), Some("luna"));
        assert_eq!(app.feed.visible_posts().len(), 1);

        handle_key_event(&mut app, press(KeyCode::Char('h'))).unwrap();
        assert_eq!(app.feed.author_filter, None);
    }

    #[test]
    fn test_consumer_cannot_open_upload() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('u'))).unwrap();
        assert_eq!(app.screen, Screen::Feed);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_help_swallows_keys() {
        let mut app = feed_app();
        handle_key_event(&mut app, press(KeyCode::Char('?'))).unwrap();
        assert!(app.show_help);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('l'))).unwrap(), None);
        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(!app.show_help);
    }

    #[test]
    fn test_composer_types_and_submits() {
        let mut app = feed_app();
        app.detail = Some(crate::detail::DetailState::new(post("a.jpg", "luna")));

        handle_key_event(&mut app, press(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Typing);
        for c in "nice".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.composer.content(), "nice");

        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)).unwrap(),
            Some(Action::SubmitComment)
        );
    }

    #[test]
    fn test_upload_fields_for_creator() {
        let session = SessionContext::in_memory();
        session.store_login("tok", Role::Creator, "sol").unwrap();
        let mut app = App::new(Arc::new(OfflineApi), session);
        app.navigate(Screen::Upload);
        assert_eq!(app.screen, Screen::Upload);

        for c in "/tmp/x.png".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(app.upload.path_input, "/tmp/x.png");
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)).unwrap(),
            Some(Action::SelectUploadFile)
        );

        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)).unwrap(),
            Some(Action::StartUpload)
        );

        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.upload.crop_to_square);

        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert_eq!(app.screen, Screen::Creator);
    }
}
