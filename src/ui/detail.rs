//! Detail view for a single movie
//!
//! Info panel on the left, trailers and reviews stacked on the right.
//! The view is the controller's presenter: every store change arrives as a
//! full list through `render_update`.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::fetch::{CollectionUpdate, DetailPresenter, FetchError};
use crate::models::{rating_label, CollectionKind, Movie, Review, Star, Trailer};
use crate::ui::Theme;

/// Focus areas in the detail view
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DetailFocus {
    #[default]
    Info,
    Trailers,
    Reviews,
}

impl DetailFocus {
    pub fn next(self) -> Self {
        match self {
            DetailFocus::Info => DetailFocus::Trailers,
            DetailFocus::Trailers => DetailFocus::Reviews,
            DetailFocus::Reviews => DetailFocus::Info,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            DetailFocus::Info => DetailFocus::Reviews,
            DetailFocus::Trailers => DetailFocus::Info,
            DetailFocus::Reviews => DetailFocus::Trailers,
        }
    }
}

/// Detail view state
#[derive(Debug)]
pub struct DetailView {
    pub movie: Movie,
    pub trailers: Vec<Trailer>,
    pub reviews: Vec<Review>,
    pub selected_trailer: usize,
    pub selected_review: usize,
    pub focus: DetailFocus,
    /// Scroll offset for overview text
    pub overview_scroll: u16,
    trailers_loaded: bool,
    reviews_loaded: bool,
}

impl DetailView {
    pub fn new(movie: Movie) -> Self {
        Self {
            movie,
            trailers: Vec::new(),
            reviews: Vec::new(),
            selected_trailer: 0,
            selected_review: 0,
            focus: DetailFocus::Info,
            overview_scroll: 0,
            trailers_loaded: false,
            reviews_loaded: false,
        }
    }

    /// Whether `kind` has been rendered at least once
    pub fn is_loaded(&self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Trailers => self.trailers_loaded,
            CollectionKind::Reviews => self.reviews_loaded,
        }
    }

    pub fn current_trailer(&self) -> Option<&Trailer> {
        self.trailers.get(self.selected_trailer)
    }

    pub fn current_review(&self) -> Option<&Review> {
        self.reviews.get(self.selected_review)
    }

    /// The entry Enter would open: kind and index within its list
    pub fn selected(&self) -> Option<(CollectionKind, usize)> {
        match self.focus {
            DetailFocus::Info => None,
            DetailFocus::Trailers => self
                .current_trailer()
                .map(|_| (CollectionKind::Trailers, self.selected_trailer)),
            DetailFocus::Reviews => self
                .current_review()
                .map(|_| (CollectionKind::Reviews, self.selected_review)),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Navigate up in current focus area
    pub fn up(&mut self) {
        match self.focus {
            DetailFocus::Info => self.overview_scroll = self.overview_scroll.saturating_sub(1),
            DetailFocus::Trailers => self.selected_trailer = self.selected_trailer.saturating_sub(1),
            DetailFocus::Reviews => self.selected_review = self.selected_review.saturating_sub(1),
        }
    }

    /// Navigate down in current focus area
    pub fn down(&mut self) {
        match self.focus {
            DetailFocus::Info => self.overview_scroll = self.overview_scroll.saturating_add(1),
            DetailFocus::Trailers => {
                if self.selected_trailer + 1 < self.trailers.len() {
                    self.selected_trailer += 1;
                }
            }
            DetailFocus::Reviews => {
                if self.selected_review + 1 < self.reviews.len() {
                    self.selected_review += 1;
                }
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let h_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.render_info_panel(frame, h_chunks[0]);

        let v_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(h_chunks[1]);

        self.render_trailers_panel(frame, v_chunks[0]);
        self.render_reviews_panel(frame, v_chunks[1]);
    }

    fn panel(&self, title: String, focus: DetailFocus) -> Block<'static> {
        let border_style = if self.focus == focus {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Span::styled(title, Theme::title()))
    }

    fn render_info_panel(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" INFO ".to_string(), DetailFocus::Info);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();

        let year = self.movie.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(self.movie.title.clone(), Theme::title()),
            Span::styled(year, Theme::dimmed()),
        ]));

        if let Some(date) = &self.movie.release_date {
            lines.push(Line::from(vec![
                Span::styled("Released: ", Theme::dimmed()),
                Span::styled(date.clone(), Theme::text()),
            ]));
        }

        lines.push(self.star_line());

        lines.push(Line::from(Span::styled(
            "─".repeat(inner.width as usize),
            Theme::dimmed(),
        )));

        if self.movie.overview.is_empty() {
            lines.push(Line::from(Span::styled("No overview", Theme::dimmed())));
        } else {
            for line in self.movie.overview.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), Theme::text())));
            }
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .scroll((self.overview_scroll, 0));

        frame.render_widget(paragraph, inner);
    }

    fn star_line(&self) -> Line<'static> {
        let mut spans: Vec<Span> = self
            .movie
            .stars()
            .iter()
            .map(|&star| {
                let style = match star {
                    Star::Empty => Theme::star_empty(),
                    Star::Half | Star::Full => Theme::star(),
                };
                Span::styled(star.glyph().to_string(), style)
            })
            .collect();

        let label = rating_label(self.movie.vote_average).unwrap_or_else(|| "Not rated".into());
        spans.push(Span::styled(format!("  {}", label), Theme::dimmed()));
        Line::from(spans)
    }

    fn render_trailers_panel(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" TRAILERS ({}) ", self.trailers.len());
        let block = self.panel(title, DetailFocus::Trailers);

        if self.trailers.is_empty() {
            frame.render_widget(self.placeholder(CollectionKind::Trailers, block), area);
            return;
        }

        let items = self
            .trailers
            .iter()
            .enumerate()
            .map(|(i, trailer)| {
                let is_selected = i == self.selected_trailer;
                row(is_selected, "▶ ", trailer.to_string())
            })
            .collect();

        render_list(frame, area, block, items, self.selected_trailer);
    }

    fn render_reviews_panel(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" REVIEWS ({}) ", self.reviews.len());
        let block = self.panel(title, DetailFocus::Reviews);

        if self.reviews.is_empty() {
            frame.render_widget(self.placeholder(CollectionKind::Reviews, block), area);
            return;
        }

        let width = area.width.saturating_sub(6) as usize;
        let items = self
            .reviews
            .iter()
            .enumerate()
            .map(|(i, review)| {
                let is_selected = i == self.selected_review;
                let author_len = review.author.chars().count() + 2;
                let text = format!(
                    "{}: {}",
                    review.author,
                    review.excerpt(width.saturating_sub(author_len).max(8))
                );
                row(is_selected, "✎ ", text)
            })
            .collect();

        render_list(frame, area, block, items, self.selected_review);
    }

    fn placeholder(&self, kind: CollectionKind, block: Block<'static>) -> Paragraph<'static> {
        let (text, style) = match (kind, self.is_loaded(kind)) {
            (CollectionKind::Trailers, false) => ("Loading trailers...", Theme::loading()),
            (CollectionKind::Reviews, false) => ("Loading reviews...", Theme::loading()),
            (CollectionKind::Trailers, true) => ("No trailers", Theme::dimmed()),
            (CollectionKind::Reviews, true) => ("No reviews", Theme::dimmed()),
        };

        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .block(block)
    }
}

fn row(is_selected: bool, marker: &'static str, text: String) -> ListItem<'static> {
    let (marker_style, text_style) = if is_selected {
        (Theme::selected(), Theme::selected())
    } else {
        (Theme::keybind(), Theme::text())
    };
    ListItem::new(Line::from(vec![
        Span::styled(marker, marker_style),
        Span::styled(text, text_style),
    ]))
}

/// Render a list, scrolled so `selected` stays visible
fn render_list(
    frame: &mut Frame,
    area: Rect,
    block: Block<'static>,
    items: Vec<ListItem<'static>>,
    selected: usize,
) {
    let visible_height = block.inner(area).height as usize;
    let offset = if visible_height > 0 && selected >= visible_height {
        selected - visible_height + 1
    } else {
        0
    };

    let items: Vec<ListItem> = items.into_iter().skip(offset).collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn clamp(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

impl DetailPresenter for DetailView {
    fn render_update(&mut self, update: CollectionUpdate<'_>) {
        match update {
            CollectionUpdate::Trailers(items) => {
                self.trailers = items.to_vec();
                self.selected_trailer = clamp(self.selected_trailer, items.len());
                self.trailers_loaded = true;
            }
            CollectionUpdate::Reviews(items) => {
                self.reviews = items.to_vec();
                self.selected_review = clamp(self.selected_review, items.len());
                self.reviews_loaded = true;
            }
        }
    }

    fn report_failure(&mut self, kind: CollectionKind, reason: &FetchError) {
        tracing::debug!(%kind, error = %reason, "detail view notified of failure");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn sample_movie() -> Movie {
        Movie {
            id: 550,
            title: "Fight Club".into(),
            overview: "A ticking-time-bomb insomniac and a slippery soap salesman.".into(),
            release_date: Some("1999-10-15".into()),
            vote_average: Some(8.4),
            poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".into()),
            backdrop_path: None,
        }
    }

    fn trailer(key: &str) -> Trailer {
        Trailer {
            id: format!("id-{}", key),
            key: key.into(),
            name: format!("Trailer {}", key),
            site: "YouTube".into(),
            kind: "Trailer".into(),
        }
    }

    fn review(author: &str) -> Review {
        Review {
            id: format!("r-{}", author),
            author: author.into(),
            content: "Great movie.".into(),
            url: format!("https://www.themoviedb.org/review/{}", author),
        }
    }

    fn screen(view: &DetailView) -> String {
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_new_view_is_loading() {
        let view = DetailView::new(sample_movie());
        assert!(!view.is_loaded(CollectionKind::Trailers));
        assert!(!view.is_loaded(CollectionKind::Reviews));
        assert_eq!(view.focus, DetailFocus::Info);
        assert!(view.selected().is_none());
    }

    #[test]
    fn test_render_update_replaces_list() {
        let mut view = DetailView::new(sample_movie());
        let trailers = vec![trailer("a"), trailer("b")];

        view.render_update(CollectionUpdate::Trailers(&trailers));
        view.render_update(CollectionUpdate::Trailers(&trailers));

        assert_eq!(view.trailers, trailers);
        assert!(view.is_loaded(CollectionKind::Trailers));
        assert!(!view.is_loaded(CollectionKind::Reviews));
    }

    #[test]
    fn test_render_update_clamps_selection() {
        let mut view = DetailView::new(sample_movie());
        let reviews = vec![review("a"), review("b"), review("c")];
        view.render_update(CollectionUpdate::Reviews(&reviews));
        view.focus = DetailFocus::Reviews;
        view.down();
        view.down();
        assert_eq!(view.selected_review, 2);

        view.render_update(CollectionUpdate::Reviews(&reviews[..1]));
        assert_eq!(view.selected_review, 0);

        view.render_update(CollectionUpdate::Reviews(&[]));
        assert_eq!(view.selected_review, 0);
        assert!(view.selected().is_none());
    }

    #[test]
    fn test_focus_cycle() {
        let mut view = DetailView::new(sample_movie());
        view.focus_next();
        assert_eq!(view.focus, DetailFocus::Trailers);
        view.focus_next();
        assert_eq!(view.focus, DetailFocus::Reviews);
        view.focus_next();
        assert_eq!(view.focus, DetailFocus::Info);
        view.focus_prev();
        assert_eq!(view.focus, DetailFocus::Reviews);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut view = DetailView::new(sample_movie());
        let trailers = vec![trailer("a"), trailer("b")];
        view.render_update(CollectionUpdate::Trailers(&trailers));
        view.focus = DetailFocus::Trailers;

        view.up();
        assert_eq!(view.selected_trailer, 0);
        view.down();
        view.down();
        view.down();
        assert_eq!(view.selected_trailer, 1);
        assert_eq!(view.selected(), Some((CollectionKind::Trailers, 1)));
    }

    #[test]
    fn test_overview_scroll() {
        let mut view = DetailView::new(sample_movie());
        view.up();
        assert_eq!(view.overview_scroll, 0);
        view.down();
        assert_eq!(view.overview_scroll, 1);
    }

    #[test]
    fn test_render_loading_then_empty() {
        let mut view = DetailView::new(sample_movie());
        let text = screen(&view);
        assert!(text.contains("Loading trailers..."));
        assert!(text.contains("Loading reviews..."));

        view.render_update(CollectionUpdate::Trailers(&[]));
        view.render_update(CollectionUpdate::Reviews(&[]));
        let text = screen(&view);
        assert!(text.contains("No trailers"));
        assert!(text.contains("No reviews"));
    }

    #[test]
    fn test_render_info_and_lists() {
        let mut view = DetailView::new(sample_movie());
        view.render_update(CollectionUpdate::Trailers(&[trailer("SUXWAEX2jlg")]));
        view.render_update(CollectionUpdate::Reviews(&[review("Goddard")]));

        let text = screen(&view);
        assert!(text.contains("Fight Club"));
        assert!(text.contains("(1999)"));
        assert!(text.contains("★★★★☆"));
        assert!(text.contains("8.4/10"));
        assert!(text.contains("Trailer SUXWAEX2jlg"));
        assert!(text.contains("Goddard"));
    }

    #[test]
    fn test_render_unrated_movie() {
        let mut movie = sample_movie();
        movie.vote_average = None;
        let view = DetailView::new(movie);
        let text = screen(&view);
        assert!(text.contains("☆☆☆☆☆"));
        assert!(text.contains("Not rated"));
    }
}
