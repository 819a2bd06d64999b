//! This file defines the navigation bar shown at the top of every page.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let links = [
            (endpoints::RECURRING_VIEW, "Recurring"),
            (endpoints::UPCOMING_VIEW, "Upcoming"),
            (endpoints::TRANSACTIONS_VIEW, "Transactions"),
            (endpoints::BUDGETS_VIEW, "Budgets"),
            (endpoints::ACCOUNTS_VIEW, "Accounts"),
            (endpoints::CATEGORIES_VIEW, "Categories"),
        ]
        .into_iter()
        .map(|(url, title)| Link {
            url,
            title,
            is_current: active_endpoint == url,
        })
        .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Cadence"
                        }
                    }

                    ul
                        class="font-medium flex flex-row p-0 space-x-8
                        rtl:space-x-reverse bg-white dark:bg-gray-900"
                    {
                        @for link in self.links {
                            li { (link.into_html()) }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let cases = [
            (endpoints::RECURRING_VIEW, true),
            (endpoints::UPCOMING_VIEW, true),
            (endpoints::TRANSACTIONS_VIEW, true),
            (endpoints::BUDGETS_VIEW, true),
            (endpoints::ACCOUNTS_VIEW, true),
            (endpoints::CATEGORIES_VIEW, true),
            (endpoints::NEW_RECURRING_VIEW, false),
            (endpoints::NEW_BUDGET_VIEW, false),
            (endpoints::ROOT, false),
            (endpoints::EDIT_RECURRING_VIEW, false),
            (endpoints::INTERNAL_ERROR_VIEW, false),
            (endpoints::POST_RECURRING, false),
        ];

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar<'_>, endpoint: &str, should_be_active: bool) {
        let active_count = nav_bar.links.iter().filter(|link| link.is_current).count();
        assert_eq!(
            active_count,
            usize::from(should_be_active),
            "want {} active link(s) for {endpoint}",
            usize::from(should_be_active)
        );

        for link in nav_bar.links {
            assert_eq!(
                link.is_current,
                link.url == endpoint,
                "link {} has the wrong active state for {endpoint}",
                link.url
            );
        }
    }
}
