#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum PageGroup {
  Main,
  Trading,
  Management,
  Research,
  Development
}

impl PageGroup {
  pub const ALL: [PageGroup; 5] = [
    PageGroup::Main,
    PageGroup::Trading,
    PageGroup::Management,
    PageGroup::Research,
    PageGroup::Development
  ];

  pub fn label(self) -> &'static str {
    match self {
      | PageGroup::Main => "Main",
      | PageGroup::Trading => "Trading",
      | PageGroup::Management => {
        "Management"
      }
      | PageGroup::Research => "Research",
      | PageGroup::Development => {
        "Development"
      }
    }
  }
}

/// One routed task page. `page_name`
/// is the backend scope key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
  pub slug:          &'static str,
  pub page_name:     &'static str,
  pub title:         &'static str,
  pub nav_label:     &'static str,
  pub group:         PageGroup,
  pub empty_message: &'static str
}

pub const HOME_PAGE: PageSpec = PageSpec {
  slug:          "home",
  page_name:     "Home",
  title:         "Project Manager",
  nav_label:     "Home",
  group:         PageGroup::Main,
  empty_message: "No tasks found. Create your first task to get started!"
};

pub const PAGES: [PageSpec; 12] = [
  HOME_PAGE,
  PageSpec {
    slug:          "algorithms",
    page_name:     "Algorithms",
    title:         "Algorithms",
    nav_label:     "Algorithms",
    group:         PageGroup::Trading,
    empty_message: "No tasks related to algorithms"
  },
  PageSpec {
    slug:          "machine-learning",
    page_name:     "Machine Learning",
    title:         "Machine Learning",
    nav_label:     "Machine Learning",
    group:         PageGroup::Trading,
    empty_message: "No tasks related to machine learning"
  },
  PageSpec {
    slug:          "broker",
    page_name:     "Broker",
    title:         "Broker",
    nav_label:     "Broker",
    group:         PageGroup::Trading,
    empty_message: "No tasks related to broker"
  },
  PageSpec {
    slug:          "backtester",
    page_name:     "Backtester",
    title:         "Backtester",
    nav_label:     "Backtester",
    group:         PageGroup::Trading,
    empty_message: "No tasks related to backtester"
  },
  PageSpec {
    slug:          "trader",
    page_name:     "Trader",
    title:         "Trader",
    nav_label:     "Trader",
    group:         PageGroup::Trading,
    empty_message: "No tasks related to trader"
  },
  PageSpec {
    slug:          "risk",
    page_name:     "Risk",
    title:         "Risk",
    nav_label:     "Risk",
    group:         PageGroup::Management,
    empty_message: "No tasks related to risk"
  },
  PageSpec {
    slug:          "portfolio-core",
    page_name:     "Portfolio Core",
    title:         "Portfolio Core",
    nav_label:     "Portfolio Core",
    group:         PageGroup::Management,
    empty_message: "No tasks related to portfolio core"
  },
  PageSpec {
    slug:          "research-lab",
    page_name:     "Research Lab",
    title:         "Research Lab",
    nav_label:     "Research Lab",
    group:         PageGroup::Research,
    empty_message: "No tasks related to research lab"
  },
  PageSpec {
    slug:          "log-manager",
    page_name:     "Log Manager",
    title:         "Log Manager",
    nav_label:     "Log Manager",
    group:         PageGroup::Management,
    empty_message: "No tasks related to log manager"
  },
  PageSpec {
    slug:          "docs",
    page_name:     "Documentation",
    title:         "Documentation",
    nav_label:     "Docs",
    group:         PageGroup::Management,
    empty_message: "No tasks related to documentation"
  },
  PageSpec {
    slug:          "front-end",
    page_name:     "Front End Design",
    title:         "Front End Design",
    nav_label:     "Front End",
    group:         PageGroup::Development,
    empty_message: "No tasks related to frontend"
  }
];

/// Matches a slug or a page name,
/// ignoring case.
pub fn find_page(
  key: &str
) -> Option<&'static PageSpec> {
  let key = key.trim();
  PAGES.iter().find(|page| {
    page.slug.eq_ignore_ascii_case(key)
      || page
        .page_name
        .eq_ignore_ascii_case(key)
  })
}

/// Page a frontend is showing: a
/// catalogue entry, or an ad-hoc page
/// for names the catalogue lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
  pub page_name:     String,
  pub title:         String,
  pub empty_message: String
}

impl PageContext {
  pub fn resolve(key: &str) -> Self {
    match find_page(key) {
      | Some(page) => Self::from(page),
      | None => {
        tracing::debug!(
          page = key,
          "page not in catalogue"
        );
        let name = key.trim().to_string();
        Self {
          title:         name.clone(),
          page_name:     name,
          empty_message: "No tasks found"
            .to_string()
        }
      }
    }
  }
}

impl From<&PageSpec> for PageContext {
  fn from(page: &PageSpec) -> Self {
    Self {
      page_name:     page.page_name.to_string(),
      title:         page.title.to_string(),
      empty_message: page
        .empty_message
        .to_string()
    }
  }
}

pub fn pages_in(
  group: PageGroup
) -> impl Iterator<Item = &'static PageSpec>
{
  PAGES
    .iter()
    .filter(move |page| page.group == group)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_by_slug_or_name() {
    assert_eq!(
      find_page("machine-learning")
        .map(|p| p.page_name),
      Some("Machine Learning")
    );
    assert_eq!(
      find_page("front end design")
        .map(|p| p.slug),
      Some("front-end")
    );
    assert!(find_page("nowhere").is_none());
  }

  #[test]
  fn unknown_pages_resolve_to_their_own_name() {
    let page = PageContext::resolve(" Ops ");
    assert_eq!(page.page_name, "Ops");
    assert_eq!(page.empty_message, "No tasks found");
    assert_eq!(
      PageContext::resolve("home").title,
      "Project Manager"
    );
  }

  #[test]
  fn slugs_are_unique() {
    for (i, page) in PAGES.iter().enumerate() {
      assert!(
        PAGES[i + 1..]
          .iter()
          .all(|other| other.slug != page.slug)
      );
    }
  }

  #[test]
  fn every_group_has_pages() {
    for group in PageGroup::ALL {
      assert!(pages_in(group).count() > 0);
    }
  }
}
