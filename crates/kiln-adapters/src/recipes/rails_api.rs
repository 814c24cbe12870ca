//! `rails-api`: a Rails 5 API application with RSpec, CI and sane defaults.
//!
//! Applied on top of a freshly generated `rails new --api` tree, so the
//! injected files (`config/application.rb` and the environment configs)
//! already exist.

use kiln_core::domain::{CommandSpec, DomainError, Pipeline, Position, Recipe, WriteMode};

pub const NAME: &str = "rails-api";

const GITIGNORE: &str = r"!.keep
*.DS_Store
*.swo
*.swp
/.bundle
/.env.local
/coverage/*
/db/*.sqlite3
/log/*
/public/system
/public/assets
/tags
/tmp/*
/vendor/bundle
";

const GEMFILE: &str = r"source '{{GEM_SOURCE}}'

ruby '{{RUBY_VERSION}}'

gem 'rails', '~> 5.0.0'
gem 'pg'
gem 'puma'
gem 'rack-cors'
gem 'jsonapi-resources'
gem 'redis'
gem 'sidekiq'

group :development do
  gem 'listen'
  gem 'rack-mini-profiler', require: false
  gem 'rubocop', require: false
  gem 'spring'
  gem 'spring-commands-rspec'
end

group :development, :test do
  gem 'annotate'
  gem 'awesome_print'
  gem 'bullet'
  gem 'bundler-audit', '>= 0.5.0', require: false
  gem 'dotenv-rails'
  gem 'factory_girl_rails'
  gem 'pry-byebug'
  gem 'pry-rails'
  gem 'rspec-rails', '~> 3.5.0'
end

group :test do
  gem 'database_cleaner'
  gem 'shoulda-matchers'
  gem 'simplecov', require: false
  gem 'timecop'
end
";

const I18N_CONFIG: &str = r"    # Set locale
    I18n.enforce_available_locales = true
    config.i18n.load_path += Dir[Rails.root.join('config', 'locales', '**', '*.{rb,yml}').to_s]
    config.i18n.default_locale = :en
";

const BULLET_CONFIG: &str = r"  # Bullet Setting (help to kill N + 1 query)
  config.after_initialize do
    Bullet.enable = true # enable Bullet gem, otherwise do nothing
    Bullet.alert = true # pop up a JavaScript alert in the browser
    Bullet.console = true #  log warnings to your browser's console.log
    Bullet.rails_logger = true #  add warnings directly to the Rails log
  end
";

const FILTER_PARAMETERS: &str = r"  # Sanitizing parameter
  config.filter_parameters += [/(password|private_token|api_endpoint)/i]
";

const CIRCLE_YML: &str = r"database:
  override:
    - bin/setup
test:
  override:
    - COVERAGE=true bin/rake
";

const RACK_MINI_PROFILER: &str = r#"if ENV["RACK_MINI_PROFILER"].to_i > 0
  require "rack-mini-profiler"

  Rack::MiniProfilerRails.initialize!(Rails.application)
end
"#;

const CORS: &str = r"# Be sure to restart your server when you modify this file.

# Avoid CORS issues when API is called from the frontend app.
# Handle Cross-Origin Resource Sharing (CORS) in order to accept cross-origin AJAX requests.

# Read more: https://github.com/cyu/rack-cors

Rails.application.config.middleware.insert_before 0, Rack::Cors do
  allow do
    origins '*'
    resource '*',
      headers: :any,
      methods: [:get, :post, :put, :patch, :delete, :options, :head]
  end
end
";

const PUMA: &str = r#"# https://devcenter.heroku.com/articles/deploying-rails-applications-with-the-puma-web-server

# The environment variable WEB_CONCURRENCY may be set to a default value based
# on dyno size. To manually configure this value use heroku config:set
# WEB_CONCURRENCY.
#
# Increasing the number of workers will increase the amount of resting memory
# your dynos use. Increasing the number of threads will increase the amount of
# potential bloat added to your dynos when they are responding to heavy
# requests.
#
# Starting with a low number of workers and threads provides adequate
# performance for most applications, even under load, while maintaining a low
# risk of overusing memory.
workers Integer(ENV.fetch("WEB_CONCURRENCY", 2))
threads_count = Integer(ENV.fetch("MAX_THREADS", 2))
threads(threads_count, threads_count)

preload_app!

rackup DefaultRackup
environment ENV.fetch("RAILS_ENV", "development")

on_worker_boot do
  # Worker specific setup for Rails 4.1+
  # See: https://devcenter.heroku.com/articles/deploying-rails-applications-with-the-puma-web-server#on-worker-boot
  ActiveRecord::Base.establish_connection
end
"#;

const RAILS_HELPER: &str = r#"ENV["RACK_ENV"] = "test"

require File.expand_path("../../config/environment", __FILE__)
abort("DATABASE_URL environment variable is set") if ENV["DATABASE_URL"]

require "rspec/rails"

Dir[Rails.root.join("spec/support/**/*.rb")].sort.each { |file| require file }

RSpec.configure do |config|
  config.infer_base_class_for_anonymous_controllers = false
  config.infer_spec_type_from_file_location!
  config.use_transactional_fixtures = false
end

ActiveRecord::Migration.maintain_test_schema!
"#;

const SPEC_HELPER: &str = r#"if ENV.fetch("COVERAGE", false)
  require "simplecov"

  if ENV["CIRCLE_ARTIFACTS"]
    dir = File.join(ENV["CIRCLE_ARTIFACTS"], "coverage")
    SimpleCov.coverage_dir(dir)
  end

  SimpleCov.start "rails"
end

# http://rubydoc.info/gems/rspec-core/RSpec/Core/Configuration
RSpec.configure do |config|
  config.expect_with :rspec do |expectations|
    expectations.syntax = :expect
  end

  config.mock_with :rspec do |mocks|
    mocks.syntax = :expect
    mocks.verify_partial_doubles = true
  end

  config.example_status_persistence_file_path = "tmp/rspec_examples.txt"
  config.order = :random
end
"#;

const SHOULDA_MATCHERS: &str = r"Shoulda::Matchers.configure do |config|
  config.integrate do |with|
    with.test_framework :rspec
    with.library :rails
  end
end
";

const FACTORY_GIRL: &str = r"RSpec.configure do |config|
  config.include FactoryGirl::Syntax::Methods
end
";

const DATABASE_CLEANER: &str = r"RSpec.configure do |config|
  config.before(:suite) do
    DatabaseCleaner.clean_with(:deletion)
  end

  config.before(:each) do
    DatabaseCleaner.strategy = :transaction
  end

  config.before(:each, js: true) do
    DatabaseCleaner.strategy = :deletion
  end

  config.before(:each) do
    DatabaseCleaner.start
  end

  config.after(:each) do
    DatabaseCleaner.clean
  end
end
";

/// Commands that must not see an enclosing Bundler environment.
fn bundled<const N: usize>(argv: [&str; N]) -> Result<CommandSpec, DomainError> {
    Ok(CommandSpec::new(argv)?.clean())
}

pub fn recipe() -> Result<Recipe, DomainError> {
    let pipeline = Pipeline::new()
        // Project files
        .write(".gitignore", GITIGNORE, WriteMode::Overwrite)?
        .write(".ruby-version", "{{RUBY_VERSION}}\n", WriteMode::Overwrite)?
        .write("Gemfile", GEMFILE, WriteMode::Overwrite)?
        .command(bundled(["bundle", "install", "--without", "production"])?)
        // Config
        .inject(
            "config/application.rb",
            "< Rails::Application",
            Position::After,
            I18N_CONFIG,
            true,
        )?
        .inject_after(
            "config/environments/development.rb",
            "config.file_watcher = ActiveSupport::EventedFileUpdateChecker",
            BULLET_CONFIG,
        )?
        .inject_after(
            "config/environments/production.rb",
            "config.active_record.dump_schema_after_migration = false",
            FILTER_PARAMETERS,
        )?
        .fetch(
            "https://raw.githubusercontent.com/rails/rails/master/.rubocop.yml",
            ".rubocop.yml",
        )?
        .fetch(
            "https://raw.github.com/svenfuchs/rails-i18n/master/rails/locale/zh-CN.yml",
            "config/locales/zh-CN.yml",
        )?
        .write("circle.yml", CIRCLE_YML, WriteMode::Overwrite)?
        // Initializers
        .write(
            "config/initializers/rack_mini_profiler.rb",
            RACK_MINI_PROFILER,
            WriteMode::Overwrite,
        )?
        .write("config/initializers/cors.rb", CORS, WriteMode::Overwrite)?
        .write("config/puma.rb", PUMA, WriteMode::Overwrite)?
        // Test env
        .command(bundled(["bundle", "exec", "rails", "generate", "rspec:install"])?)
        .write("spec/rails_helper.rb", RAILS_HELPER, WriteMode::Overwrite)?
        .write("spec/spec_helper.rb", SPEC_HELPER, WriteMode::Overwrite)?
        .write(
            "spec/support/shoulda_matchers.rb",
            SHOULDA_MATCHERS,
            WriteMode::Overwrite,
        )?
        .write("spec/support/factory_girl.rb", FACTORY_GIRL, WriteMode::Overwrite)?
        .write(
            "spec/support/database_cleaner.rb",
            DATABASE_CLEANER,
            WriteMode::Overwrite,
        )?
        // Version control
        .run(["git", "init"])?
        .run(["git", "add", "."])?
        .run(["git", "commit", "-a", "-m", "Initial commit"])?
        .command(bundled(["bin/rails", "db:create"])?);

    Ok(Recipe::new(
        NAME,
        "Rails 5 API with RSpec, Bullet, CORS, Puma and CircleCI",
        pipeline,
    )?
    .requires("RUBY_VERSION")
    .with_default("GEM_SOURCE", "https://rubygems.org"))
}
