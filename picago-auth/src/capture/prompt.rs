use url::Url;

/// Shows the consent URL to the user.
pub trait ConsentPrompt: Send + Sync {
    fn show(&self, url: &Url);
}

/// Prints the consent URL on standard output. No browser is launched.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutPrompt;

impl ConsentPrompt for StdoutPrompt {
    fn show(&self, url: &Url) {
        println!("Visit this URL to get a code, then run again with code=YOUR_CODE\n");
        println!("{}", url);
    }
}

impl<F> ConsentPrompt for F
where
    F: Fn(&Url) + Send + Sync,
{
    fn show(&self, url: &Url) {
        self(url)
    }
}
